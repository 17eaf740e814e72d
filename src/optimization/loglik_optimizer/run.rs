//! Execution helpers that run an `argmin` solver on a bounded log-density
//! problem and return a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{adapter::ArgMinAdapter, Grad, LogDensity, OptimOptions, OptimOutcome, Theta},
};
#[cfg(feature = "obs_slog")]
use argmin::core::CostFunction;
use argmin::core::{Executor, IterState, Solver, State};

/// Run an L-BFGS solver for a log-density problem.
///
/// Wires up the adapted problem, the chosen L-BFGS variant, the initial
/// solver-space vector `x0`, optional observers (behind the `obs_slog`
/// feature) and optional `max_iters`, then executes the solver. The best
/// solver-space vector is mapped back through the problem's
/// [`ParamSpace`](crate::optimization::loglik_optimizer::bounds::ParamSpace)
/// before the outcome is validated.
///
/// # Errors
/// - Propagates any `argmin` runtime error (solver errors, line-search
///   failures, objective errors) via `From<argmin::core::Error>`.
/// - Propagates validation errors encountered when constructing
///   [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    x0: Theta, opts: &OptimOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogDensity,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + 'static,
{
    let space = problem.space;
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&x0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(x0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let theta_hat = result.take_best_param().map(|x| space.to_param(&x));
    OptimOutcome::new(theta_hat, -result.get_best_cost(), termination, iterations, function_counts, grad)
}

/// Run a Nelder–Mead solver for a log-density problem.
///
/// The simplex is carried by the solver itself, so no initial parameter is
/// set on the executor state. The best vertex is clipped into the bounds
/// before the outcome is validated.
///
/// # Errors
/// Same as [`run_lbfgs`].
pub fn run_nelder_mead<'a, F, S>(
    opts: &OptimOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogDensity,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, (), (), (), (), f64>> + 'static,
{
    let space = problem.space;
    let mut optimizer = Executor::new(problem, solver);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let theta_hat = result.take_best_param().map(|x| space.to_param(&x));
    OptimOutcome::new(theta_hat, -result.get_best_cost(), termination, iterations, function_counts, None)
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(x0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogDensity,
{
    use argmin::core::Gradient;
    use argmin_math::ArgminL2Norm;

    let ll0 = -problem.cost(x0)?;
    let g0n = problem.gradient(x0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
