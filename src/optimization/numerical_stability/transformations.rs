//! Numerical stability utilities.
//!
//! Provides safe implementations of common nonlinear transforms
//! that are prone to overflow/underflow in naïve form.
//! The functions here follow guarded strategies similar to those
//! in major ML libraries (e.g. PyTorch, TensorFlow), using explicit
//! cutoffs (`x > 20.0`) to keep `f64` arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`LOGIT_EPS`]: clamp applied to probabilities before taking a logit.
//! - [`safe_softplus(x)`]: stable version of `ln(1 + exp(x))`,
//!   mapping ℝ → (0, ∞) without overflow.
//! - [`safe_softplus_inv(x)`]: inverse of softplus, mapping
//!   (0, ∞) → ℝ without catastrophic cancellation.
//! - [`safe_logistic(x)`]: `1 / (1 + exp(-x))`, mapping ℝ → (0, 1); also the
//!   derivative of softplus.
//! - [`safe_logit(p)`]: inverse of the logistic on a clamped `p`.
//!
//! # Rationale
//! Gradient-based solvers in this crate work on an unconstrained vector and
//! reach bounded calibration parameters through these maps, so they must stay
//! finite over the whole real line.

/// Probabilities are clamped into `[LOGIT_EPS, 1 − LOGIT_EPS]` before a logit.
pub const LOGIT_EPS: f64 = 1e-12;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// Computes softplus without overflow for large positive `x` and
/// with good precision for large negative `x`. This implementation
/// uses a simple piecewise guard:
///
/// - For sufficiently large `x`, `softplus(x) ≈ x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise, it falls back to `ln1p(exp(x))`.
///
/// # Parameters
/// - `x`: real input
///
/// # Returns
/// - `softplus(x)` as `f64`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Stable inverse of softplus on `(0, ∞)`: solves for `t` in
/// `softplus(t) = x`, returning `t = ln(exp(x) - 1)`.
///
/// - For sufficiently large `x`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise, it uses `ln(expm1(x))`.
///
/// # Parameters
/// - `x`: a positive real (the softplus output), must be finite and `> 0`.
///
/// # Returns
/// - `t` such that `softplus(t) = x`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp_m1().ln()
    }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Branches on the sign of `x` so that `exp` is only ever evaluated on a
/// non-positive argument.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Logit `ln(p / (1 − p))` with `p` clamped into `[LOGIT_EPS, 1 − LOGIT_EPS]`.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    p.ln() - (-p).ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Softplus and its inverse agree with the naïve formulas on a safe grid
    // and invert each other.
    fn softplus_matches_naive_and_inverts() {
        for &x in &[-8.0, -1.5, 0.0, 0.3, 4.0, 12.0] {
            let naive = (1.0 + f64::exp(x)).ln();
            assert_relative_eq!(safe_softplus(x), naive, max_relative = 1e-12);
            assert_relative_eq!(safe_softplus_inv(safe_softplus(x)), x, epsilon = 1e-9);
        }
    }

    #[test]
    fn softplus_is_finite_in_the_tails() {
        assert!(safe_softplus(800.0).is_finite());
        assert!(safe_softplus(-800.0) >= 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Logistic stays inside (0, 1), is symmetric, and logit inverts it.
    fn logistic_symmetry_and_logit_inverse() {
        for &x in &[-30.0, -2.0, 0.0, 0.7, 25.0] {
            let s = safe_logistic(x);
            assert!((0.0..=1.0).contains(&s));
            assert_relative_eq!(s + safe_logistic(-x), 1.0, epsilon = 1e-15);
        }
        for &x in &[-5.0, -0.25, 0.0, 1.0, 6.0] {
            assert_relative_eq!(safe_logit(safe_logistic(x)), x, epsilon = 1e-9);
        }
    }
}
