//! loglik_optimizer — argmin-powered, box-constrained log-density optimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! log-densities** `ℓ(θ)` (log-likelihoods or log-posteriors) under
//! per-coordinate bounds. Callers implement a single trait, [`LogDensity`],
//! and invoke [`maximize`] with a [`Bounds`] box and [`OptimOptions`].
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into Argmin-compatible costs `c = -ℓ` via
//!   [`adapter::ArgMinAdapter`], which also applies the bounds handling of
//!   [`bounds::ParamSpace`].
//! - Expose a single entrypoint [`maximize`] that:
//!   - validates the initial guess against the bounds and
//!     [`LogDensity::check`],
//!   - selects Nelder–Mead (clipping) or L-BFGS (reparametrization) from
//!     [`Method`], building the solver via [`builders`],
//!   - executes it via [`run`], and
//!   - normalizes results into an [`OptimOutcome`] in the caller's space.
//! - Fall back to finite-difference gradients when no analytic gradient is
//!   provided.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`;
//!   user code implements `ℓ` and optionally `∇ℓ`, **never** the cost.
//! - [`LogDensity::value`] must report invalid inputs as recoverable
//!   [`OptError`](crate::optimization::errors::OptError) values, not panics.
//! - `theta_hat` in every returned [`OptimOutcome`] lies inside the bounds.
//!
//! Conventions
//! -----------
//! - Cost is always `-ℓ` internally; all user-facing values (including
//!   [`OptimOutcome::value`]) are expressed in terms of `ℓ`.
//! - Errors bubble up as `OptResult<T>`; this module and its children never
//!   intentionally panic or use `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - The calibration layer implements [`LogDensity`] for its posterior and
//!   calls [`maximize`] with bounds derived from prior supports.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign and chain-rule handling in
//!   [`adapter`], bounds maps in [`bounds`], solver construction in
//!   [`builders`], option/outcome invariants in [`traits`], and toy
//!   maximizations for both methods in [`api`].

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::bounds::{Bounds, BoundsMode, ParamSpace};
pub use self::traits::{LineSearcher, LogDensity, Method, OptimOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM, DEFAULT_NM_SD_TOL};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::bounds::Bounds;
    pub use super::traits::{LineSearcher, LogDensity, Method, OptimOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
