//! Public API surface for log-density maximization.
//!
//! - [`LogDensity`]: trait users implement for their objective.
//! - [`OptimOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`Method`]: choice of bounded local solver.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by the high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-density `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-density (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
        Cost, FnEvalMap, Grad, Theta,
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented log-density interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-density `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, finite differences are used automatically.
pub trait LogDensity {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Bounded local optimization method.
///
/// Variants:
/// - `NelderMead`: derivative-free simplex; bounds are enforced by clipping
///   every vertex and trial point into the box.
/// - `Lbfgs`: quasi-Newton with finite-difference gradients; bounds are
///   enforced by an interior reparametrization of each coordinate.
///
/// Parsing accepts the conventional names (`"Nelder-Mead"`, `"L-BFGS-B"`)
/// case-insensitively. Names of solvers that cannot honour box constraints
/// return [`OptError::MethodWithoutBounds`]; anything else is
/// [`OptError::InvalidMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    NelderMead,
    Lbfgs,
}

impl FromStr for Method {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nelder-mead" | "neldermead" => Ok(Method::NelderMead),
            "l-bfgs-b" | "lbfgsb" | "l-bfgs" | "lbfgs" => Ok(Method::Lbfgs),
            "bfgs" | "cg" | "newton-cg" | "steepestdescent" | "steepest-descent" | "dogleg"
            | "trust-ncg" | "trust-exact" | "trust-krylov" => {
                Err(OptError::MethodWithoutBounds { name: s.to_string() })
            }
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'Nelder-Mead' or 'L-BFGS-B'.",
            }),
        }
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances`: numerical tolerances and iteration limits. For
///   Nelder–Mead, `tol_cost` is the simplex cost standard-deviation tolerance.
/// - `method: Method`: bounded solver to use.
/// - `line_searcher: LineSearcher`: line-search algorithm used by L-BFGS.
/// - `verbose: bool`: if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>`: L-BFGS history size, default 7.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = 1e-8`, `max_iter = 500`
/// - `method`: `NelderMead`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimOptions {
    pub tols: Tolerances,
    pub method: Method,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl OptimOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric tolerances are validated in [`Tolerances::new`]; this
    /// constructor only rejects a zero L-BFGS memory.
    pub fn new(
        tols: Tolerances, method: Method, line_searcher: LineSearcher, verbose: bool,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, method, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for OptimOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: Some(1e-8), max_iter: Some(500) },
            method: Method::NelderMead,
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost (L-BFGS) or the simplex
///   cost spread (Nelder–Mead) falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found, in the caller's (bounded) space.
/// - `value`: best **log-density** value `ℓ(θ̂)` (not the cost).
/// - `converged`: `true` only if the solver met its own convergence
///   criterion (or a target cost); hitting `max_iter` is not convergence.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`, keyed by
///   argmin’s counter names (`cost_count`, `gradient_count`, ...).
/// - `grad_norm`: norm of the last available gradient, if present. For
///   L-BFGS this is measured in the unconstrained solver space.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }

    /// Number of objective evaluations recorded by the solver.
    pub fn cost_count(&self) -> u64 {
        self.fn_evals.get("cost_count").copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Bounded method names parse; unbounded solvers are rejected with a
    // dedicated error rather than a generic "unknown method".
    fn method_parsing_distinguishes_unbounded_solvers() {
        assert_eq!("Nelder-Mead".parse::<Method>().unwrap(), Method::NelderMead);
        assert_eq!("l-bfgs-b".parse::<Method>().unwrap(), Method::Lbfgs);
        assert!(matches!(
            "BFGS".parse::<Method>(),
            Err(OptError::MethodWithoutBounds { .. })
        ));
        assert!(matches!("Powellish".parse::<Method>(), Err(OptError::InvalidMethod { .. })));
    }

    #[test]
    fn tolerances_require_at_least_one_rule() {
        assert!(matches!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided)));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(Tolerances::new(None, Some(1e-9), None).is_ok());
    }

    #[test]
    fn options_reject_zero_lbfgs_memory() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).unwrap();
        let res = OptimOptions::new(tols, Method::Lbfgs, LineSearcher::HagerZhang, false, Some(0));
        assert!(matches!(res, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Only a genuine convergence termination counts as success.
    //
    // Given
    // -----
    // - Identical raw state terminated by convergence vs by max iterations.
    //
    // Expect
    // ------
    // - `converged` is true for the first and false for the second.
    fn outcome_success_flag_follows_termination_reason() {
        let ok = OptimOutcome::new(
            Some(array![1.0]),
            -2.0,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            4,
            FnEvalMap::new(),
            None,
        )
        .unwrap();
        let capped = OptimOutcome::new(
            Some(array![1.0]),
            -2.0,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            4,
            FnEvalMap::new(),
            None,
        )
        .unwrap();

        assert!(ok.converged);
        assert!(!capped.converged);
        assert_eq!(capped.status, "MaxItersReached");
        assert_eq!(ok.cost_count(), 0);
    }
}
