//! calibration — MAP calibration of an HIV projection engine.
//!
//! Purpose
//! -------
//! Fit the free parameters of a compartmental HIV projection so that its
//! prevalence trajectories match antenatal-clinic (ANC) and household survey
//! data. The engine itself is an opaque collaborator reached through
//! [`ProjectionEngine`]; this module owns everything between a parameter
//! vector and a scalar log posterior.
//!
//! Key behaviors
//! -------------
//! - [`core::priors`]: Beta / Gamma / LogNormal / Normal priors with padded
//!   supports.
//! - [`core::params`]: the parameter registry and its frozen, name-ordered
//!   [`ParameterSet`] (vectors, bounds, log prior, fitted values).
//! - [`core::keys`] + [`core::mapper`]: enum-keyed setters that write a
//!   vector into the [`ModelState`] and push only the stale inputs.
//! - [`core::state`]: raw inputs, derived engine tensors, dirty flags and a
//!   version counter.
//! - [`models::calibrator`]: log prior, log likelihood, log posterior, and
//!   the bounded optimizer driver.
//! - [`models::sensitivity`]: re-projection under alternative mixing inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter names are validated when the registry is built; evaluation
//!   never meets an unknown key.
//! - Every initial value lies inside its prior's padded support.
//! - Each evaluation invalidates the engine from the first year, so the
//!   posterior is a pure function of the vector.
//!
//! Conventions
//! -----------
//! - Parameter vectors are ordered lexicographically by parameter name.
//! - Year-indexed inputs start at
//!   [`INPUT_FIRST_YEAR`](core::constants::INPUT_FIRST_YEAR); projection
//!   outputs start at the first year of the window.
//! - Errors are [`CalibError`] values; transform and optimizer errors are
//!   wrapped transparently.
//! - Logging goes through `tracing`: `info!` at calibration start and end,
//!   `debug!` per likelihood evaluation.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule; `tests/` drives the full
//!   pipeline against a deterministic in-memory engine.

pub mod core;
pub mod errors;
pub mod models;

pub use self::core::engine::{
    EngineConfig, Invalidation, ProjectionEngine, ProjectionOutputs, TransmissionParams,
};
pub use self::core::keys::FitKey;
pub use self::core::observations::{
    AncLikelihood, AncLikelihoodParams, PopSelector, SexSelector, SurveyLikelihood,
    SurveyObservation,
};
pub use self::core::params::{Parameter, ParameterRegistry, ParameterSet, ParameterSpec};
pub use self::core::priors::{Prior, PriorKind};
pub use self::core::state::{EpiParams, HivFertility, ModelInputs, ModelState, PwidRisk};
pub use self::errors::{CalibError, CalibResult};
pub use self::models::calibrator::{CalibrationReport, Calibrator};

pub mod prelude {
    pub use super::core::constants::YearWindow;
    pub use super::{
        AncLikelihood, AncLikelihoodParams, CalibError, CalibResult, CalibrationReport,
        Calibrator, EngineConfig, Invalidation, ModelInputs, ParameterRegistry, PriorKind,
        ProjectionEngine, ProjectionOutputs, SurveyLikelihood, SurveyObservation,
    };
}
