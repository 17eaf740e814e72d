//! Fit-parameter registry.
//!
//! [`ParameterRegistry`] collects parameter definitions (name, initial value,
//! prior) and validates them; [`ParameterRegistry::build`] freezes them into a
//! [`ParameterSet`]. The set orders parameters lexicographically by name, and
//! that order is the canonical layout of every parameter vector, bounds array
//! and prior sum.
//!
//! ## Invariants validated at registration
//! - the name parses as a [`FitKey`],
//! - no name is registered twice,
//! - the prior parameters are valid,
//! - the initial value lies inside the prior's padded support.
use std::collections::BTreeMap;

use ndarray::Array1;

use crate::calibration::core::keys::FitKey;
use crate::calibration::core::priors::{Prior, PriorKind};
use crate::calibration::errors::{CalibError, CalibResult};
use crate::optimization::loglik_optimizer::{Bounds, Theta};

/// One fit parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub key: FitKey,
    pub initial_value: f64,
    pub prior: Prior,
    /// `None` until calibration completes.
    pub fitted_value: Option<f64>,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn support(&self) -> (f64, f64) {
        self.prior.support()
    }
}

/// Tabular parameter definition, as read from a configuration sheet.
///
/// `prior` holds the distribution name; `p1`, `p2` are its parameters in
/// the [`Prior::new`] convention (Gamma takes a rate).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSpec {
    pub name: String,
    pub initial: f64,
    pub prior: String,
    pub p1: f64,
    pub p2: f64,
    pub enabled: bool,
}

/// Mutable collection of parameter definitions.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    params: BTreeMap<FitKey, Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one parameter. Disabled entries are validated for a known
    /// name and otherwise dropped.
    ///
    /// # Errors
    /// - [`CalibError::UnknownParameter`] for a name without a setter.
    /// - [`CalibError::DuplicateParameter`] if the name is already present.
    /// - [`CalibError::InvalidPrior`] for invalid prior parameters.
    /// - [`CalibError::InfeasibleInitial`] if `initial` lies outside the
    ///   padded support.
    pub fn register(
        &mut self, name: &str, initial: f64, kind: PriorKind, p1: f64, p2: f64, enabled: bool,
    ) -> CalibResult<&mut Self> {
        let key: FitKey = name.parse()?;
        if !enabled {
            return Ok(self);
        }
        if self.params.contains_key(&key) {
            return Err(CalibError::DuplicateParameter { name: name.to_string() });
        }
        let prior = Prior::new(kind, p1, p2)?;
        let (lower, upper) = prior.support();
        if !prior.in_support(initial) {
            return Err(CalibError::InfeasibleInitial {
                name: name.to_string(),
                value: initial,
                lower,
                upper,
            });
        }
        self.params.insert(key, Parameter { key, initial_value: initial, prior, fitted_value: None });
        Ok(self)
    }

    /// Register from a tabular definition.
    ///
    /// # Errors
    /// As [`ParameterRegistry::register`], plus [`CalibError::UnknownPrior`].
    pub fn register_spec(&mut self, spec: &ParameterSpec) -> CalibResult<&mut Self> {
        let kind: PriorKind = spec.prior.parse()?;
        self.register(&spec.name, spec.initial, kind, spec.p1, spec.p2, spec.enabled)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn build(self) -> ParameterSet {
        let mut params: Vec<Parameter> = self.params.into_values().collect();
        params.sort_by(|a, b| a.name().cmp(b.name()));
        ParameterSet { params }
    }
}

/// Frozen parameter set in canonical (name-sorted) order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn sorted_keys(&self) -> Vec<&'static str> {
        self.params.iter().map(Parameter::name).collect()
    }

    /// Keys in canonical order.
    pub fn keys(&self) -> Vec<FitKey> {
        self.params.iter().map(|p| p.key).collect()
    }

    /// Initial values in canonical order.
    pub fn to_vector(&self) -> Theta {
        self.params.iter().map(|p| p.initial_value).collect::<Array1<f64>>()
    }

    /// Fitted values in canonical order.
    ///
    /// # Errors
    /// [`CalibError::NotFitted`] naming the first parameter without one.
    pub fn fitted_vector(&self) -> CalibResult<Theta> {
        self.params
            .iter()
            .map(|p| p.fitted_value.ok_or_else(|| CalibError::NotFitted { name: p.name().to_string() }))
            .collect::<CalibResult<Vec<f64>>>()
            .map(Array1::from)
    }

    /// Name → value map of `x`.
    ///
    /// # Errors
    /// [`CalibError::VectorLengthMismatch`] if `x` has the wrong length.
    pub fn from_vector(&self, x: &Theta) -> CalibResult<BTreeMap<String, f64>> {
        self.check_len(x)?;
        Ok(self.params.iter().zip(x.iter()).map(|(p, &v)| (p.name().to_string(), v)).collect())
    }

    /// Optimizer bounds from the padded prior supports.
    pub fn bounds(&self) -> CalibResult<Bounds> {
        let (lower, upper): (Vec<f64>, Vec<f64>) = self.params.iter().map(Parameter::support).unzip();
        Ok(Bounds::new(Array1::from(lower), Array1::from(upper))?)
    }

    /// Sum of prior log densities at `x`.
    ///
    /// # Errors
    /// [`CalibError::VectorLengthMismatch`] if `x` has the wrong length.
    pub fn log_prior(&self, x: &Theta) -> CalibResult<f64> {
        self.check_len(x)?;
        Ok(self.params.iter().zip(x.iter()).map(|(p, &v)| p.prior.log_density(v)).sum())
    }

    /// Store `x` as the fitted values.
    ///
    /// # Errors
    /// [`CalibError::VectorLengthMismatch`] if `x` has the wrong length.
    pub fn set_fitted(&mut self, x: &Theta) -> CalibResult<()> {
        self.check_len(x)?;
        for (p, &v) in self.params.iter_mut().zip(x.iter()) {
            p.fitted_value = Some(v);
        }
        Ok(())
    }

    /// Whether every entry of `x` lies inside its parameter's support.
    pub fn in_support(&self, x: &Theta) -> bool {
        x.len() == self.len() && self.params.iter().zip(x.iter()).all(|(p, &v)| p.prior.in_support(v))
    }

    fn check_len(&self, x: &Theta) -> CalibResult<()> {
        if x.len() != self.len() {
            return Err(CalibError::VectorLengthMismatch { expected: self.len(), found: x.len() });
        }
        Ok(())
    }
}
