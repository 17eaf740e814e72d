//! Distribution fitting shared by the transforms.
//!
//! - [`beta`] / [`normal`]: `statrs` constructors with errors mapped into
//!   [`TransformError`].
//! - [`Fisk`]: a shifted log-logistic distribution fitted to an age-difference
//!   mean and variance by Newton-Raphson.
use std::f64::consts::{FRAC_PI_2, PI};

use statrs::distribution::{Beta, Normal};

use crate::transforms::errors::{TransformError, TransformResult};

/// Assumed floor of opposite-sex age differences (female partners at most ten
/// years older than their male partners).
pub const FISK_SHIFT: f64 = -10.0;

/// Newton-Raphson iteration cap for the Fisk shape.
pub const FISK_MAX_ITER: usize = 50;

/// Residual below which Newton-Raphson stops early.
const FISK_STOP_TOL: f64 = 1e-12;

/// Largest residual accepted as converged.
pub const FISK_ACCEPT_TOL: f64 = 1e-8;

pub fn beta(a: f64, b: f64) -> TransformResult<Beta> {
    Beta::new(a, b).map_err(|e| TransformError::InvalidDistribution {
        dist: "Beta",
        p1: a,
        p2: b,
        reason: e.to_string(),
    })
}

pub fn normal(mean: f64, sd: f64) -> TransformResult<Normal> {
    Normal::new(mean, sd).map_err(|e| TransformError::InvalidDistribution {
        dist: "Normal",
        p1: mean,
        p2: sd,
        reason: e.to_string(),
    })
}

/// Log-logistic distribution with location `loc`:
/// `F(d) = 1 / (1 + ((d − loc) / scale)^(−shape))` for `d > loc`, else 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fisk {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
}

impl Fisk {
    /// Fit shape and scale so that the distribution, shifted by
    /// [`FISK_SHIFT`], has the given mean and variance.
    ///
    /// With `m = mean − shift` and `x = π / shape`, the moments reduce to
    /// `x·cot(x) = m² / (m² + var)`, solved by Newton-Raphson from
    /// `x₀ = π/2 − target`; then `scale = m·sin(x) / x`.
    ///
    /// # Errors
    /// - [`TransformError::InvalidAgePreference`] if `mean ≤ shift` or
    ///   `var ≤ 0` (no log-logistic fit exists).
    /// - [`TransformError::RootNotConverged`] if the iteration leaves
    ///   `(0, π/2)` or the final residual exceeds [`FISK_ACCEPT_TOL`].
    pub fn fit_age_difference(mean: f64, var: f64) -> TransformResult<Self> {
        let m = mean - FISK_SHIFT;
        if !(m.is_finite() && m > 0.0) {
            return Err(TransformError::InvalidAgePreference {
                name: "mean age difference",
                value: mean,
                reason: "must be finite and exceed the assumed -10 year floor",
            });
        }
        if !(var.is_finite() && var > 0.0) {
            return Err(TransformError::InvalidAgePreference {
                name: "age difference variance",
                value: var,
                reason: "must be finite and positive",
            });
        }

        let target = m * m / (m * m + var);
        let residual_at = |x: f64| x / x.tan() - target;

        let mut x = FRAC_PI_2 - target;
        let mut residual = residual_at(x);
        let mut iterations = 0;
        while iterations < FISK_MAX_ITER && residual.abs() >= FISK_STOP_TOL {
            let cot_x = 1.0 / x.tan();
            let csc_x = 1.0 / x.sin();
            x -= residual / (cot_x - x * csc_x * csc_x);
            residual = residual_at(x);
            iterations += 1;
        }

        let in_range = x.is_finite() && x > 0.0 && x < FRAC_PI_2;
        if !in_range || !(residual.abs() <= FISK_ACCEPT_TOL) {
            return Err(TransformError::RootNotConverged { iterations, x, residual });
        }
        Ok(Self { shape: PI / x, loc: FISK_SHIFT, scale: m * x.sin() / x })
    }

    pub fn cdf(&self, d: f64) -> f64 {
        if d <= self.loc {
            return 0.0;
        }
        1.0 / (1.0 + ((d - self.loc) / self.scale).powf(-self.shape))
    }

    /// Mean of the shifted distribution (finite for `shape > 1`).
    pub fn mean(&self) -> f64 {
        let x = PI / self.shape;
        self.loc + self.scale * x / x.sin()
    }

    /// Variance (finite for `shape > 2`).
    pub fn variance(&self) -> f64 {
        let x = PI / self.shape;
        self.scale * self.scale * (2.0 * x / (2.0 * x).sin() - (x / x.sin()).powi(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // The fitted Fisk distribution reproduces the requested moments.
    //
    // Given
    // -----
    // - Typical opposite-sex age-difference moments (mean 5, var 40) and a
    //   near-degenerate pair (mean -9, var 900).
    //
    // Expect
    // ------
    // - Mean and variance of the fit match the inputs.
    fn fisk_fit_matches_target_moments() {
        for &(mean, var) in &[(5.0, 40.0), (2.5, 16.0), (-9.0, 900.0)] {
            let fisk = Fisk::fit_age_difference(mean, var).unwrap();
            assert_relative_eq!(fisk.mean(), mean, epsilon = 1e-6);
            assert_relative_eq!(fisk.variance(), var, max_relative = 1e-5);
        }
    }

    #[test]
    fn fisk_cdf_is_monotone_from_the_floor() {
        let fisk = Fisk::fit_age_difference(4.0, 30.0).unwrap();
        assert_eq!(fisk.cdf(-10.0), 0.0);
        assert_eq!(fisk.cdf(-25.0), 0.0);
        let mut prev = 0.0;
        for d in -9..60 {
            let c = fisk.cdf(d as f64);
            assert!(c >= prev && c <= 1.0);
            prev = c;
        }
        assert!(prev > 0.99);
    }

    #[test]
    fn impossible_moments_are_rejected() {
        assert!(matches!(
            Fisk::fit_age_difference(-10.0, 25.0),
            Err(TransformError::InvalidAgePreference { .. })
        ));
        assert!(matches!(
            Fisk::fit_age_difference(3.0, 0.0),
            Err(TransformError::InvalidAgePreference { .. })
        ));
    }

    #[test]
    fn statrs_errors_are_mapped() {
        assert!(matches!(beta(0.0, 1.0), Err(TransformError::InvalidDistribution { dist: "Beta", .. })));
        assert!(matches!(normal(0.0, -1.0), Err(TransformError::InvalidDistribution { dist: "Normal", .. })));
    }
}
