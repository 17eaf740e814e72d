//! High-level entry point for maximizing a user-provided `LogDensity` under
//! box constraints.
//!
//! This validates the starting point, picks the solver named by
//! `opts.method`, wraps the objective in an `ArgMinAdapter` (which
//! *minimizes* `-ℓ(θ)`) with the matching bounds handling, and delegates the
//! run to `run_nelder_mead` or `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::ArgMinAdapter,
        bounds::{Bounds, BoundsMode, ParamSpace},
        builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, run_nelder_mead},
        traits::{LineSearcher, LogDensity, Method, OptimOptions},
        OptimOutcome, Theta,
    },
};

/// Maximize a log-density `ℓ(θ)` subject to `bounds`.
///
/// # Behavior
/// - Checks that `theta0` matches the bounds' dimension and is feasible,
///   then validates it via `f.check(theta0, data)`.
/// - `Method::NelderMead`: builds a feasible initial simplex around `theta0`
///   and clips every trial point into the box.
/// - `Method::Lbfgs`: maps `theta0` into an unconstrained space, runs L-BFGS
///   there with the configured line search, and maps the result back.
///
/// # Errors
/// - `BoundsDimMismatch` / `InfeasibleStart` for a bad starting point.
/// - Propagates any error from `f.check`, the builders, or the run.
///
/// # Returns
/// An [`OptimOutcome`] with `theta_hat` inside the bounds and the best
/// value `ℓ(θ̂)`.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use epi_calibrate::optimization::errors::OptResult;
/// use epi_calibrate::optimization::loglik_optimizer::{
///     maximize, Bounds, LogDensity, OptimOptions, Theta,
/// };
///
/// struct Bowl;
/// impl LogDensity for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let bounds = Bounds::new(array![-1.0, -1.0], array![1.0, 1.0])?;
/// let out = maximize(&Bowl, array![0.5, -0.5], &(), &bounds, &OptimOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), epi_calibrate::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogDensity>(
    f: &F, theta0: Theta, data: &F::Data, bounds: &Bounds, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    bounds.check_feasible(&theta0)?;
    f.check(&theta0, data)?;
    match opts.method {
        Method::NelderMead => {
            let problem = ArgMinAdapter::new(f, data, ParamSpace::new(bounds, BoundsMode::Clip));
            let solver = build_nelder_mead(&theta0, bounds, opts)?;
            run_nelder_mead(opts, problem, solver)
        }
        Method::Lbfgs => {
            let space = ParamSpace::new(bounds, BoundsMode::Reparametrize);
            let x0 = space.from_param(&theta0);
            let problem = ArgMinAdapter::new(f, data, space);
            match opts.line_searcher {
                LineSearcher::MoreThuente => {
                    let solver = build_optimizer_more_thuente(opts)?;
                    run_lbfgs(x0, opts, problem, solver)
                }
                LineSearcher::HagerZhang => {
                    let solver = build_optimizer_hager_zhang(opts)?;
                    run_lbfgs(x0, opts, problem, solver)
                }
            }
        }
    }
}
