//! Errors raised while turning tabular inputs into engine tensors.
//!
//! Every variant describes a degenerate or malformed input; the transforms
//! never return NaN-filled tensors in place of an error.
use thiserror::Error;

/// Result alias for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    // ---- Shapes and years ----
    /// An input table has the wrong shape.
    #[error("Input '{input}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch { input: &'static str, expected: Vec<usize>, found: Vec<usize> },

    /// Projection years must start no earlier than the input tables.
    #[error("Invalid year window {first}..={last}")]
    InvalidYearWindow { first: i32, last: i32 },

    /// A year-indexed table does not cover the projection window.
    #[error("Input table has {available} years, projection needs {needed}")]
    InputYearsTooShort { needed: usize, available: usize },

    // ---- Distribution fitting ----
    /// A fitted distribution received parameters outside its domain.
    #[error("Invalid {dist} parameters ({p1}, {p2}): {reason}")]
    InvalidDistribution { dist: &'static str, p1: f64, p2: f64, reason: String },

    /// Newton-Raphson for the Fisk shape did not reach the tolerance.
    #[error("Fisk fit did not converge after {iterations} iterations (x = {x}, residual = {residual})")]
    RootNotConverged { iterations: usize, x: f64, residual: f64 },

    /// Age-difference moments that no log-logistic distribution can match.
    #[error("Invalid age preference {name} = {value}: {reason}")]
    InvalidAgePreference { name: &'static str, value: f64, reason: &'static str },

    // ---- MTCT ----
    /// A named MTCT rate is missing from the input table.
    #[error("Missing MTCT rate '{name}'")]
    MissingMtctRate { name: String },
}
