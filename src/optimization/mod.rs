//! optimization — bounded MAP/MLE stack, numerical helpers, and error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model calibration, combining an
//! Argmin-backed log-density optimizer with box constraints, numerically
//! stable scalar transforms, and a single error/result surface. Callers
//! implement a log-density, choose a method and tolerances, and obtain
//! fitted parameters and diagnostics without touching backend solver
//! details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-densities** `ℓ(θ)` under
//!   per-coordinate bounds (`loglik_optimizer`), including configuration of
//!   solvers and stopping criteria.
//! - Supply shared numerical primitives (`numerical_stability`) used to map
//!   an unconstrained solver vector into bounded parameters.
//! - Normalize configuration issues, numerical failures, objective errors
//!   and backend solver errors into a single enum (`errors::OptError`) with
//!   a common result alias (`OptResult<T>`).
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize `ℓ(θ)` by minimizing an internal cost
//!   `c(θ) = -ℓ(θ)`; user-facing APIs and outcomes are expressed in terms
//!   of `ℓ`.
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - This module never logs through `tracing`; progress output is limited to
//!   the optional `obs_slog` observer.
//!
//! Downstream usage
//! ----------------
//! - `calibration::models::calibrator` implements `LogDensity` for the
//!   log-posterior and calls `maximize` with bounds taken from prior
//!   supports.
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use epi_calibrate::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
