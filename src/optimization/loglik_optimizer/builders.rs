//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the solvers used by the log-density
//! optimizer. These helpers hide Argmin’s generic wiring and apply
//! crate-level options (tolerances, memory size, simplex construction) so
//! that higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente
//!   line search based on crate-level aliases.
//! - Apply optional gradient and cost-change tolerances from
//!   [`OptimOptions`] via a shared configuration helper.
//! - Construct a Nelder–Mead solver from a bounded initial simplex.
//! - Leave the initial parameter vector (L-BFGS) and maximum iterations to
//!   the runner, keeping these builders side-effect free.
//!
//! Invariants & assumptions
//! ------------------------
//! - All solvers operate on [`Theta`], [`Grad`], and [`Cost`].
//! - The L-BFGS memory (`m`) is either provided via `opts.lbfgs_mem` or
//!   defaults to [`DEFAULT_LBFGS_MEM`].
//! - The Nelder–Mead simplex has `n + 1` distinct vertices, every one of
//!   them inside the bounds.
//!
//! Testing notes
//! -------------
//! - Unit tests verify memory propagation, tolerance wiring, and the shape
//!   and feasibility of the initial simplex (including vertices that start
//!   on a bound).
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        bounds::Bounds,
        traits::OptimOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS,
            NelderMeadSolver, Theta, DEFAULT_LBFGS_MEM, DEFAULT_NM_SD_TOL,
        },
    },
};

/// Relative step used to build each non-base simplex vertex.
const SIMPLEX_REL_STEP: f64 = 0.05;

/// Absolute step used for coordinates that start at zero.
const SIMPLEX_ZERO_STEP: f64 = 0.00025;

/// Construct L-BFGS with Hager–Zhang line search and any configured tolerances.
///
/// # Errors
/// Returns an `OptError` (via `From<argmin::core::Error>`) when Argmin
/// rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &OptimOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search and any configured tolerances.
///
/// # Errors
/// Returns an `OptError` (via `From<argmin::core::Error>`) when Argmin
/// rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &OptimOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional tolerances to an L-BFGS solver, regardless of line search.
///
/// When a tolerance is `None`, the corresponding `with_tolerance_*` method
/// is not called and Argmin’s default remains in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OptimOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Construct a Nelder–Mead solver around `theta0`.
///
/// The simplex tolerance is the standard deviation of vertex costs,
/// `opts.tols.tol_cost` or [`DEFAULT_NM_SD_TOL`].
///
/// # Errors
/// Returns an `OptError` when Argmin rejects the simplex or the tolerance.
pub fn build_nelder_mead(
    theta0: &Theta, bounds: &Bounds, opts: &OptimOptions,
) -> OptResult<NelderMeadSolver> {
    let simplex = initial_simplex(theta0, bounds);
    let tol = opts.tols.tol_cost.unwrap_or(DEFAULT_NM_SD_TOL);
    Ok(NelderMeadSolver::new(simplex).with_sd_tolerance(tol)?)
}

/// Build `n + 1` vertices: `theta0` plus one vertex per coordinate moved by
/// 5% of its magnitude (or a small absolute step at zero). A step that
/// would leave the box is taken in the opposite direction, and as a last
/// resort shrunk to fit the box.
pub fn initial_simplex(theta0: &Theta, bounds: &Bounds) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());

    for i in 0..theta0.len() {
        let base = theta0[i];
        let (lo, hi) = (bounds.lower()[i], bounds.upper()[i]);
        let step = if base == 0.0 { SIMPLEX_ZERO_STEP } else { SIMPLEX_REL_STEP * base.abs() };

        let value = if base + step <= hi {
            base + step
        } else if base - step >= lo {
            base - step
        } else if hi - base >= base - lo {
            base + 0.5 * (hi - base)
        } else {
            base - 0.5 * (base - lo)
        };

        let mut vertex = theta0.clone();
        vertex[i] = value;
        vertices.push(vertex);
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, Method, Tolerances};
    use ndarray::array;

    fn opts(method: Method, line_searcher: LineSearcher, mem: Option<usize>) -> OptimOptions {
        let tols =
            Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).expect("Tolerances should be valid");
        OptimOptions::new(tols, method, line_searcher, false, mem)
            .expect("OptimOptions should be valid")
    }

    #[test]
    // Purpose
    // -------
    // Both L-BFGS builders succeed with default and explicit memory.
    fn lbfgs_builders_accept_default_and_explicit_memory() {
        assert!(build_optimizer_hager_zhang(&opts(Method::Lbfgs, LineSearcher::HagerZhang, None))
            .is_ok());
        assert!(build_optimizer_hager_zhang(&opts(
            Method::Lbfgs,
            LineSearcher::HagerZhang,
            Some(11)
        ))
        .is_ok());
        assert!(build_optimizer_more_thuente(&opts(
            Method::Lbfgs,
            LineSearcher::MoreThuente,
            None
        ))
        .is_ok());
    }

    #[test]
    fn configure_lbfgs_respects_absent_tolerances() {
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).expect("Tolerances should be valid");
        let opts = OptimOptions::new(tols, Method::Lbfgs, LineSearcher::MoreThuente, false, None)
            .expect("OptimOptions should be valid");

        assert!(configure_lbfgs(raw, &opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The initial simplex has n + 1 distinct, feasible vertices even when
    // the starting point sits on a bound or at zero.
    //
    // Given
    // -----
    // - θ₀ = (1.0 on its upper bound, 0.0, -2.0) with a two-sided, a
    //   lower-only and a free coordinate.
    //
    // Expect
    // ------
    // - 4 vertices, vertex 0 is θ₀, each other vertex differs from θ₀ in
    //   exactly its own coordinate, and all are inside the box.
    fn initial_simplex_is_feasible_and_non_degenerate() {
        let bounds = Bounds::new(
            array![0.0, 0.0, f64::NEG_INFINITY],
            array![1.0, f64::INFINITY, f64::INFINITY],
        )
        .unwrap();
        let theta0 = array![1.0, 0.0, -2.0];

        let simplex = initial_simplex(&theta0, &bounds);

        assert_eq!(simplex.len(), 4);
        assert_eq!(simplex[0], theta0);
        assert!((simplex[1][0] - 0.95).abs() < 1e-12);
        assert!((simplex[2][1] - SIMPLEX_ZERO_STEP).abs() < 1e-15);
        assert!((simplex[3][2] + 1.9).abs() < 1e-12);
        for (k, v) in simplex.iter().enumerate().skip(1) {
            assert!(bounds.check_feasible(v).is_ok());
            for j in 0..3 {
                assert_eq!(v[j] != theta0[j], j == k - 1);
            }
        }
    }

    #[test]
    fn nelder_mead_builder_accepts_valid_tolerance() {
        let bounds = Bounds::unbounded(2);
        let solver =
            build_nelder_mead(&array![0.5, 0.5], &bounds, &opts(Method::NelderMead, LineSearcher::MoreThuente, None));
        assert!(solver.is_ok());
    }
}
