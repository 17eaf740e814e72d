//! epi_calibrate — MAP calibration and input transformation for a
//! compartmental HIV projection model.
//!
//! Purpose
//! -------
//! Serve as the crate root for callers that drive an HIV projection engine:
//! turn sparse tabular inputs into engine tensors, and fit the model's free
//! parameters to antenatal-clinic and household survey prevalence data by
//! maximizing a log posterior under box constraints.
//!
//! Key behaviors
//! -------------
//! - [`transforms`]: pure, deterministic conversions from input tables to
//!   engine tensors (partner rates, age mixing, assortativity, mixing
//!   levels, STI prevalence, MTCT rates).
//! - [`calibration`]: priors, the parameter registry, the versioned model
//!   state, the engine and likelihood contracts, the posterior composer,
//!   and sensitivity sweeps.
//! - [`optimization`]: a bounded, Argmin-backed log-density maximizer
//!   (Nelder–Mead with clipping, L-BFGS with an interior reparametrization).
//!
//! Invariants & assumptions
//! ------------------------
//! - The projection engine is deterministic: identical pushed inputs give
//!   identical outputs.
//! - Evaluation is single-threaded; a calibrator owns its engine.
//!
//! Conventions
//! -----------
//! - Indexing follows the engine's fixed layout constants in
//!   [`calibration::core::constants`] (sex, age, risk population).
//! - Each layer has its own error enum and result alias (`TransformError`,
//!   `CalibError`, `OptError`) with `From` conversions between them.
//! - The crate performs no file I/O; spreadsheet parsing and engine
//!   internals belong to the caller.
//!
//! Testing notes
//! -------------
//! - Unit tests sit beside each module; `tests/` runs the end-to-end
//!   calibration pipeline against an in-memory engine.

pub mod calibration;
pub mod optimization;
pub mod transforms;
