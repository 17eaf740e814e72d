//! transforms — deterministic conversion of sparse input tables into engine
//! tensors.
//!
//! Purpose
//! -------
//! Turn the compact, spreadsheet-shaped inputs of a projection (trends by
//! input year, age parameters, raw population tables in percent) into the
//! dense tensors the projection engine consumes. Every function here is pure:
//! identical inputs give bit-identical outputs, and no function touches
//! engine or calibration state.
//!
//! Key behaviors
//! -------------
//! - [`partner_rates`]: partnership rates `(year, sex, age, pop)` as the outer
//!   product of a calendar trend, a Beta age pattern, and population rate
//!   ratios.
//! - [`age_mixing`]: partner age preferences `(sex, age, sex, age)` from a
//!   Fisk fit to opposite-sex age-difference moments and a normal for
//!   male-male partnerships.
//! - [`pop_assortativity`]: percent → proportion, `(sex, pop)`.
//! - [`mixing_levels`]: 12 × 12 raw levels → `(sex, pop, sex, pop)`.
//! - [`sti_prevalence`]: STI prevalence `(year, sex, age, pop)`.
//! - [`mtct_rates`]: mother-to-child transmission `(timing, regimen, CD4)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Raw population tables omit the never-had-sex group and store TGW in the
//!   female (gender identity) column; every transform that reads them pads
//!   never-had-sex with zero and moves TGW into the male (assigned sex at
//!   birth) block.
//! - Year-indexed inputs start at
//!   [`INPUT_FIRST_YEAR`](crate::calibration::core::constants::INPUT_FIRST_YEAR);
//!   the projection window selects a contiguous slice of them.
//! - The terminal 80+ age bin carries no partnership or STI mass.
//!
//! Conventions
//! -----------
//! - Malformed shapes, short year ranges, and parameters outside a
//!   distribution's domain are reported as [`TransformError`] values.
//! - Degenerate age-mixing rows (no mass) are left at zero and logged via
//!   `tracing::warn!`; this is the only logging in the module.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its layout conventions and
//!   numeric invariants (row sums, moment matching, homogeneity in the
//!   trend, TGW relocation, regimen aliasing).

pub mod age_mixing;
pub mod assortativity;
pub mod distributions;
pub mod errors;
pub mod mix_levels;
pub mod mtct;
pub mod partner_rates;
pub mod sti_prev;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::age_mixing::{age_mixing, AgePreferences};
pub use self::assortativity::pop_assortativity;
pub use self::errors::{TransformError, TransformResult};
pub use self::mix_levels::{mixing_levels, N_MIX_RAW};
pub use self::mtct::{mtct_input_names, mtct_rates, MtctInputs};
pub use self::partner_rates::partner_rates;
pub use self::sti_prev::sti_prevalence;
