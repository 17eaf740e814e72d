//! Errors for calibration (parameter configuration, state mapping, engine
//! interaction, estimate extraction, and optimizer failures).
//!
//! ## Conventions
//! - Configuration errors (unknown names, bad priors, infeasible initial
//!   values) surface when the registry is built, never during evaluation.
//! - Degenerate estimates (zero births, empty survey cells) are errors rather
//!   than NaN likelihood values.
//! - Transform and optimizer failures keep their own enums and are wrapped
//!   via `From`, so `?` works across layers.
use thiserror::Error;

use crate::optimization::errors::OptError;
use crate::transforms::errors::TransformError;

/// Result alias for calibration operations.
pub type CalibResult<T> = Result<T, CalibError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibError {
    // ---- Priors ----
    /// Distribution name not recognized.
    #[error("Unknown prior distribution '{name}'")]
    UnknownPrior { name: String },

    /// Distribution parameters outside their domain.
    #[error("Invalid {kind} prior ({p1}, {p2}): {reason}")]
    InvalidPrior { kind: &'static str, p1: f64, p2: f64, reason: String },

    // ---- Registry ----
    /// Parameter name has no setter.
    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    /// The same parameter was registered twice.
    #[error("Parameter '{name}' registered more than once")]
    DuplicateParameter { name: String },

    /// Initial value lies outside the prior support.
    #[error("Initial value of '{name}' is {value}, outside its support [{lower}, {upper}]")]
    InfeasibleInitial { name: String, value: f64, lower: f64, upper: f64 },

    /// Parameter vector length differs from the registry size.
    #[error("Parameter vector has length {found}, expected {expected}")]
    VectorLengthMismatch { expected: usize, found: usize },

    /// A fitted value was requested before calibration completed.
    #[error("Parameter '{name}' has not been fitted")]
    NotFitted { name: String },

    // ---- Model state ----
    /// The epidemic seed year lies outside the projection window.
    #[error("Seed year {year} outside the projection window {first}..={last}")]
    SeedYearOutsideWindow { year: i32, first: i32, last: i32 },

    // ---- Observations ----
    /// A survey template row is malformed.
    #[error("Invalid survey row {index}: {reason}")]
    InvalidSurveyRow { index: usize, reason: String },

    /// Unrecognized sex or population selector.
    #[error("Invalid {kind} selector '{value}'")]
    InvalidSelector { kind: &'static str, value: String },

    /// An estimate would divide by zero.
    #[error("Degenerate {what} estimate at index {index}")]
    DegenerateEstimate { what: &'static str, index: usize },

    // ---- Engine ----
    /// The projection engine reported a failure.
    #[error("Projection engine error: {text}")]
    Engine { text: String },

    /// The engine was configured for a different projection window.
    #[error("Engine window {engine_first}..={engine_last} differs from input window {input_first}..={input_last}")]
    WindowMismatch { engine_first: i32, engine_last: i32, input_first: i32, input_last: i32 },

    /// Engine output has an unexpected shape.
    #[error("Engine output '{output}' has shape {found:?}, expected {expected:?}")]
    OutputShape { output: &'static str, expected: Vec<usize>, found: Vec<usize> },

    // ---- Wrapped layers ----
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Optimization(#[from] OptError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Lower-layer errors convert via `?` and keep their message.
    fn wrapped_errors_are_transparent() {
        let t: CalibError = TransformError::InvalidYearWindow { first: 1960, last: 2000 }.into();
        assert_eq!(t.to_string(), "Invalid year window 1960..=2000");

        let o: CalibError = OptError::NoTolerancesProvided.into();
        assert!(matches!(o, CalibError::Optimization(OptError::NoTolerancesProvided)));
    }

    #[test]
    fn calibration_errors_travel_through_the_optimizer_as_text() {
        let err = CalibError::DegenerateEstimate { what: "ANC prevalence", index: 3 };
        let opt: OptError = err.clone().into();
        assert_eq!(opt, OptError::Objective { text: err.to_string() });
    }
}
