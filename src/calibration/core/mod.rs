//! Building blocks of calibration: layout constants, priors, the parameter
//! registry, the model-state snapshot and its setters, and the contracts of
//! the external engine and likelihood evaluators.
pub mod constants;
pub mod engine;
pub mod keys;
pub mod mapper;
pub mod observations;
pub mod params;
pub mod priors;
pub mod state;
