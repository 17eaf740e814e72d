//! loglik_optimizer::bounds — box constraints and their solver-space maps.
//!
//! Purpose
//! -------
//! Represent per-coordinate box constraints `lower ≤ θ ≤ upper` and provide
//! the two ways the optimizer honours them:
//!
//! - [`BoundsMode::Clip`]: the solver works directly on `θ` and every trial
//!   point is clipped into the box before evaluation (used by Nelder–Mead).
//! - [`BoundsMode::Reparametrize`]: the solver works on an unconstrained
//!   vector `z` and each coordinate is mapped smoothly into the box (used by
//!   L-BFGS, whose line searches need a differentiable objective).
//!
//! Invariants & assumptions
//! ------------------------
//! - [`Bounds::new`] guarantees equal lengths, no `NaN`, and
//!   `lower[i] < upper[i]`; infinite edges are allowed.
//! - Reparametrization per coordinate:
//!   - both edges finite: `θ = lo + (hi − lo)·σ(z)`
//!   - lower only: `θ = lo + softplus(z)`
//!   - upper only: `θ = hi − softplus(−z)`
//!   - neither: `θ = z`
//!
//! Testing notes
//! -------------
//! - Unit tests cover validation errors, clipping, map/inverse agreement
//!   for all four edge patterns, and the Jacobian against finite differences.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::Theta,
    numerical_stability::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, LOGIT_EPS,
    },
};

/// Box constraints on a parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Theta,
    upper: Theta,
}

impl Bounds {
    /// Construct validated bounds.
    ///
    /// # Errors
    /// - [`OptError::BoundsDimMismatch`] if `lower` and `upper` differ in length.
    /// - [`OptError::InvalidBounds`] if an edge is `NaN` or `lower ≥ upper`.
    pub fn new(lower: Theta, upper: Theta) -> OptResult<Self> {
        if lower.len() != upper.len() {
            return Err(OptError::BoundsDimMismatch {
                expected: lower.len(),
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Bounds must not be NaN.",
                });
            }
            if lo >= hi {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Lower bound must be strictly below the upper bound.",
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Bounds that leave every coordinate free.
    pub fn unbounded(dim: usize) -> Self {
        Self {
            lower: Theta::from_elem(dim, f64::NEG_INFINITY),
            upper: Theta::from_elem(dim, f64::INFINITY),
        }
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Theta {
        &self.lower
    }

    pub fn upper(&self) -> &Theta {
        &self.upper
    }

    /// Check that `theta` has the bounds' dimension and lies inside the box.
    ///
    /// # Errors
    /// - [`OptError::BoundsDimMismatch`] on a length mismatch.
    /// - [`OptError::InfeasibleStart`] for the first coordinate outside the box.
    pub fn check_feasible(&self, theta: &Theta) -> OptResult<()> {
        if theta.len() != self.dim() {
            return Err(OptError::BoundsDimMismatch {
                expected: theta.len(),
                lower: self.lower.len(),
                upper: self.upper.len(),
            });
        }
        for (index, &value) in theta.iter().enumerate() {
            let (lower, upper) = (self.lower[index], self.upper[index]);
            if !(lower..=upper).contains(&value) {
                return Err(OptError::InfeasibleStart { index, value, lower, upper });
            }
        }
        Ok(())
    }

    /// Clip every coordinate of `theta` into the box.
    pub fn clip(&self, theta: &Theta) -> Theta {
        let mut out = theta.clone();
        out.iter_mut().enumerate().for_each(|(i, v)| *v = v.clamp(self.lower[i], self.upper[i]));
        out
    }

    /// Map an unconstrained vector `z` into the box.
    pub fn to_constrained(&self, z: &Theta) -> Theta {
        let mut out = z.clone();
        for (i, v) in out.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            *v = match (lo.is_finite(), hi.is_finite()) {
                (true, true) => (lo + (hi - lo) * safe_logistic(*v)).clamp(lo, hi),
                (true, false) => lo + safe_softplus(*v),
                (false, true) => hi - safe_softplus(-*v),
                (false, false) => *v,
            };
        }
        out
    }

    /// Inverse of [`Bounds::to_constrained`]. Points on a finite edge are
    /// pulled inside by `LOGIT_EPS` (relative to the interval width for
    /// two-sided boxes).
    pub fn to_unconstrained(&self, theta: &Theta) -> Theta {
        let mut out = theta.clone();
        for (i, v) in out.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            *v = match (lo.is_finite(), hi.is_finite()) {
                (true, true) => safe_logit((*v - lo) / (hi - lo)),
                (true, false) => safe_softplus_inv((*v - lo).max(LOGIT_EPS)),
                (false, true) => -safe_softplus_inv((hi - *v).max(LOGIT_EPS)),
                (false, false) => *v,
            };
        }
        out
    }

    /// Diagonal of `dθ/dz` at `z`, used to chain analytic gradients.
    pub fn jacobian_diag(&self, z: &Theta) -> Theta {
        let mut out = z.clone();
        for (i, v) in out.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            *v = match (lo.is_finite(), hi.is_finite()) {
                (true, true) => {
                    let s = safe_logistic(*v);
                    (hi - lo) * s * (1.0 - s)
                }
                (true, false) => safe_logistic(*v),
                (false, true) => safe_logistic(-*v),
                (false, false) => 1.0,
            };
        }
        out
    }
}

/// How a solver honours [`Bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsMode {
    Clip,
    Reparametrize,
}

/// Solver-space view of a bounded problem: converts between the vector the
/// solver iterates on and the parameter vector the objective sees.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpace<'a> {
    pub bounds: &'a Bounds,
    pub mode: BoundsMode,
}

impl<'a> ParamSpace<'a> {
    pub fn new(bounds: &'a Bounds, mode: BoundsMode) -> Self {
        Self { bounds, mode }
    }

    /// Solver vector → objective parameters.
    pub fn to_param(&self, x: &Theta) -> Theta {
        match self.mode {
            BoundsMode::Clip => self.bounds.clip(x),
            BoundsMode::Reparametrize => self.bounds.to_constrained(x),
        }
    }

    /// Objective parameters → solver vector.
    pub fn from_param(&self, theta: &Theta) -> Theta {
        match self.mode {
            BoundsMode::Clip => theta.clone(),
            BoundsMode::Reparametrize => self.bounds.to_unconstrained(theta),
        }
    }

    /// `dθ/dx` for the chain rule. Clipping is treated as the identity.
    pub fn jacobian_diag(&self, x: &Theta) -> Theta {
        match self.mode {
            BoundsMode::Clip => Theta::ones(x.len()),
            BoundsMode::Reparametrize => self.bounds.jacobian_diag(x),
        }
    }
}
