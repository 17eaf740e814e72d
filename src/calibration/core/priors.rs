//! Prior distributions for fit parameters.
//!
//! A [`Prior`] wraps one of four `statrs` families behind a uniform
//! `log_density` and reports a support interval that is padded away from
//! finite edges, where the log density typically diverges.
use std::str::FromStr;

use statrs::distribution::{Beta, Continuous, Gamma, LogNormal, Normal};

use crate::calibration::errors::{CalibError, CalibResult};

/// Padding applied to finite support edges.
pub const SUPPORT_PADDING: f64 = 1e-10;

/// Prior family.
///
/// Parsing is case-insensitive: `"Beta"`, `"Gamma"`, `"Lognormal"` (or
/// `"LogNormal"`), `"Normal"`. Any other name is
/// [`CalibError::UnknownPrior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriorKind {
    Beta,
    Gamma,
    LogNormal,
    Normal,
}

impl PriorKind {
    pub fn name(&self) -> &'static str {
        match self {
            PriorKind::Beta => "Beta",
            PriorKind::Gamma => "Gamma",
            PriorKind::LogNormal => "Lognormal",
            PriorKind::Normal => "Normal",
        }
    }
}

impl FromStr for PriorKind {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beta" => Ok(PriorKind::Beta),
            "gamma" => Ok(PriorKind::Gamma),
            "lognormal" => Ok(PriorKind::LogNormal),
            "normal" => Ok(PriorKind::Normal),
            _ => Err(CalibError::UnknownPrior { name: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone)]
enum Density {
    Beta(Beta),
    Gamma(Gamma),
    LogNormal(LogNormal),
    Normal(Normal),
}

/// A validated prior.
///
/// Fields:
/// - `kind`: distribution family.
/// - `shape1`: Beta α, Gamma shape, LogNormal meanlog, Normal mean.
/// - `shape2`: Beta β, Gamma **scale** (converted from the supplied rate),
///   LogNormal sdlog, Normal sd.
#[derive(Debug, Clone)]
pub struct Prior {
    pub kind: PriorKind,
    pub shape1: f64,
    pub shape2: f64,
    density: Density,
}

impl Prior {
    /// Build a prior from the workbook convention `(p1, p2)`.
    ///
    /// For Gamma, `p2` is a **rate** and is stored as the scale `1 / p2`.
    ///
    /// # Errors
    /// [`CalibError::InvalidPrior`] if `statrs` rejects the parameters
    /// (non-finite values, non-positive shapes, rates or standard deviations).
    pub fn new(kind: PriorKind, p1: f64, p2: f64) -> CalibResult<Self> {
        let invalid = |reason: String| CalibError::InvalidPrior { kind: kind.name(), p1, p2, reason };
        if !(p1.is_finite() && p2.is_finite()) {
            return Err(invalid("parameters must be finite".to_string()));
        }
        let (shape2, density) = match kind {
            PriorKind::Beta => {
                (p2, Density::Beta(Beta::new(p1, p2).map_err(|e| invalid(e.to_string()))?))
            }
            PriorKind::Gamma => {
                if p2 <= 0.0 {
                    return Err(invalid("rate must be positive".to_string()));
                }
                let g = Gamma::new(p1, p2).map_err(|e| invalid(e.to_string()))?;
                (1.0 / p2, Density::Gamma(g))
            }
            PriorKind::LogNormal => (
                p2,
                Density::LogNormal(LogNormal::new(p1, p2).map_err(|e| invalid(e.to_string()))?),
            ),
            PriorKind::Normal => {
                (p2, Density::Normal(Normal::new(p1, p2).map_err(|e| invalid(e.to_string()))?))
            }
        };
        Ok(Self { kind, shape1: p1, shape2, density })
    }

    /// Log density at `x`; `-inf` outside the distribution's domain.
    pub fn log_density(&self, x: f64) -> f64 {
        match &self.density {
            Density::Beta(d) => d.ln_pdf(x),
            Density::Gamma(d) => d.ln_pdf(x),
            Density::LogNormal(d) => d.ln_pdf(x),
            Density::Normal(d) => d.ln_pdf(x),
        }
    }

    /// Padded support `(lower, upper)`.
    pub fn support(&self) -> (f64, f64) {
        match self.kind {
            PriorKind::Beta => (SUPPORT_PADDING, 1.0 - SUPPORT_PADDING),
            PriorKind::Gamma | PriorKind::LogNormal => (SUPPORT_PADDING, f64::INFINITY),
            PriorKind::Normal => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn in_support(&self, x: f64) -> bool {
        let (lo, hi) = self.support();
        x >= lo && x <= hi
    }
}

impl PartialEq for Prior {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.shape1 == other.shape1 && self.shape2 == other.shape2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn prior_names_parse_case_insensitively() {
        assert_eq!("Beta".parse::<PriorKind>().unwrap(), PriorKind::Beta);
        assert_eq!("Lognormal".parse::<PriorKind>().unwrap(), PriorKind::LogNormal);
        assert_eq!("LogNormal".parse::<PriorKind>().unwrap(), PriorKind::LogNormal);
        assert_eq!("NORMAL".parse::<PriorKind>().unwrap(), PriorKind::Normal);
        assert!(matches!("Cauchy".parse::<PriorKind>(), Err(CalibError::UnknownPrior { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Beta supports are padded away from 0 and 1 and the density is finite
    // at the padded edges.
    fn beta_support_edges_are_padded() {
        let prior = Prior::new(PriorKind::Beta, 2.0, 5.0).unwrap();
        let (lo, hi) = prior.support();
        assert_eq!(lo, 1e-10);
        assert_eq!(hi, 1.0 - 1e-10);
        assert!(prior.log_density(lo).is_finite());
        assert!(prior.log_density(hi).is_finite());
        assert!(!prior.in_support(0.0));
    }

    #[test]
    // Purpose
    // -------
    // Gamma priors take a rate and store a scale.
    //
    // Given
    // -----
    // - Gamma(shape = 2, rate = 4).
    //
    // Expect
    // ------
    // - shape2 = 0.25.
    // - log density at x = 0.5 equals ln(4² · 0.5 · e^{-2}).
    fn gamma_rate_is_converted_to_scale() {
        let prior = Prior::new(PriorKind::Gamma, 2.0, 4.0).unwrap();
        assert_eq!(prior.shape2, 0.25);
        let expected = (16.0 * 0.5 * (-2.0f64).exp()).ln();
        assert_relative_eq!(prior.log_density(0.5), expected, epsilon = 1e-12);
    }

    #[test]
    fn lognormal_and_normal_match_closed_forms() {
        let ln = Prior::new(PriorKind::LogNormal, 0.0, 1.0).unwrap();
        assert_relative_eq!(ln.log_density(1.0), -0.5 * (2.0 * PI).ln(), epsilon = 1e-12);
        assert_eq!(ln.support(), (1e-10, f64::INFINITY));

        let n = Prior::new(PriorKind::Normal, 1.0, 2.0).unwrap();
        assert_relative_eq!(n.log_density(1.0), -(2.0 * (2.0 * PI).sqrt()).ln(), epsilon = 1e-12);
        assert_eq!(n.support(), (f64::NEG_INFINITY, f64::INFINITY));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            Prior::new(PriorKind::Beta, -1.0, 2.0),
            Err(CalibError::InvalidPrior { kind: "Beta", .. })
        ));
        assert!(matches!(Prior::new(PriorKind::Gamma, 2.0, 0.0), Err(CalibError::InvalidPrior { .. })));
        assert!(matches!(Prior::new(PriorKind::Normal, 0.0, -1.0), Err(CalibError::InvalidPrior { .. })));
        assert!(matches!(
            Prior::new(PriorKind::Normal, f64::NAN, 1.0),
            Err(CalibError::InvalidPrior { .. })
        ));
    }
}
