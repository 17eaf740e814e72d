//! numerical_stability — numerically robust scalar transforms.
//!
//! Purpose
//! -------
//! Collect the numerically stable scalar maps used to move between an
//! unconstrained optimizer space and bounded calibration parameters. The
//! bounded reparametrization in `loglik_optimizer::bounds` is built entirely
//! from these primitives.
//!
//! Key behaviors
//! -------------
//! - Provide stable scalar transforms (`safe_softplus`, its inverse,
//!   `safe_logistic`, `safe_logit`) for mapping unconstrained reals into
//!   half-open or open intervals without overflow/underflow.
//! - Centralize the logit clamp (`LOGIT_EPS`) so callers share one guard.
//!
//! Invariants & assumptions
//! ------------------------
//! - All transforms assume finite `f64` inputs; bound validation happens in
//!   the optimizer layer, not here.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas on
//!   safe grids, tail behavior, and inverse pairs.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, LOGIT_EPS,
};

pub mod prelude {
    pub use super::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, LOGIT_EPS,
    };
}
