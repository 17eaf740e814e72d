//! Contract between the calibration layer and the projection engine.
//!
//! The engine is an opaque, deterministic simulator. The calibration layer
//! only pushes input tensors into it, asks it to project through a year, and
//! reads its output tensors back; it never inspects engine internals.
use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayView4, ArrayView6};

use crate::calibration::core::constants::YearWindow;
use crate::calibration::errors::CalibResult;

/// Which cached projection years an engine must recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Every year; the next `project` starts from the first year.
    FromStart,
    /// The given calendar year and every later year.
    FromYear(i32),
}

/// Engine start-up configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub years: YearWindow,
    /// Name of the demographic input set the engine loads at start-up.
    pub demography: String,
}

/// The full transmission parameter set. Engines accept it all at once, so
/// changing any one value re-sends every field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransmissionParams {
    /// Per-act female-to-male transmission probability.
    pub f2m: f64,
    /// Per-act male-to-female transmission probability.
    pub m2f: f64,
    /// Per-act male-to-male transmission probability.
    pub m2m: f64,
    /// Relative infectiousness during primary infection.
    pub primary: f64,
    /// Relative infectiousness during chronic infection.
    pub chronic: f64,
    /// Relative infectiousness during symptomatic infection.
    pub symptom: f64,
    /// Relative infectiousness on ART, virally suppressed.
    pub art_vs: f64,
    /// Relative infectiousness on ART, virologic failure.
    pub art_vf: f64,
    /// Transmission cofactor when the HIV-positive partner has an STI.
    pub sti_pos: f64,
    /// Susceptibility cofactor when the HIV-negative partner has an STI.
    pub sti_neg: f64,
}

/// Read-only views of the engine's output tensors.
///
/// Shapes for a window of `Y` years:
/// - `pop_adult_neg`: `(Y, N_SEX_MC, N_AGE_ADULT, N_POP)`
/// - `pop_adult_hiv`: `(Y, N_SEX_MC, N_AGE_ADULT, N_POP, N_HIV_ADULT, N_DTX)`
/// - `births`: `(Y, N_SEX)`
/// - `births_exposed`: `(Y,)`
/// - `new_infections`: `(Y, N_SEX_MC, N_AGE, N_POP)`
#[derive(Debug, Clone)]
pub struct ProjectionOutputs<'a> {
    pub pop_adult_neg: ArrayView4<'a, f64>,
    pub pop_adult_hiv: ArrayView6<'a, f64>,
    pub births: ArrayView2<'a, f64>,
    pub births_exposed: ArrayView1<'a, f64>,
    pub new_infections: ArrayView4<'a, f64>,
}

/// Operations the calibration layer needs from a projection engine.
///
/// `share_*` calls replace an input tensor the engine reads on every
/// projection; `init_*` calls configure inputs that only change between
/// calibration evaluations. None of them invalidates cached years: callers
/// follow input changes with [`ProjectionEngine::invalidate`].
pub trait ProjectionEngine {
    /// Prepare the engine for the configured projection window.
    fn initialize(&mut self, config: &EngineConfig) -> CalibResult<()>;

    /// Partner rates `(year, sex, age, pop)`.
    fn share_partner_rate(&mut self, rates: ArrayView4<f64>) -> CalibResult<()>;

    /// Age mixing `(sex, age, sex, age)`.
    fn share_age_mixing(&mut self, mixing: ArrayView4<f64>) -> CalibResult<()>;

    /// Population assortativity `(sex, pop)`.
    fn share_pop_assort(&mut self, assort: ArrayView2<f64>) -> CalibResult<()>;

    /// PWID force of infection `(year, sex)` and needle-sharing `(year,)`.
    fn share_pwid_risk(
        &mut self, force: ArrayView2<f64>, needle_sharing: ArrayView1<f64>,
    ) -> CalibResult<()>;

    /// Mixing levels `(sex, pop, sex, pop)`.
    fn init_mixing_matrix(&mut self, levels: ArrayView4<i32>) -> CalibResult<()>;

    /// STI prevalence `(year, sex, age, pop)`.
    fn init_sti_prev(&mut self, sti: ArrayView4<f64>) -> CalibResult<()>;

    /// MTCT rates `(timing, regimen, CD4)`.
    fn init_mtct_rates(&mut self, rates: ArrayView3<f64>) -> CalibResult<()>;

    fn init_transmission(&mut self, params: &TransmissionParams) -> CalibResult<()>;

    /// HIV fertility rate ratios by `(year, age band)`, CD4 stage, and ART
    /// duration, already scaled by the local adjustment factor.
    fn init_hiv_fertility(
        &mut self, age: ArrayView2<f64>, cd4: ArrayView1<f64>, art: ArrayView1<f64>,
    ) -> CalibResult<()>;

    /// Seed the epidemic at projection index `year_index`.
    fn init_epidemic_seed(&mut self, year_index: usize, prevalence: f64) -> CalibResult<()>;

    /// Project (or resume projecting) through calendar year `year`.
    fn project(&mut self, year: i32) -> CalibResult<()>;

    fn invalidate(&mut self, from: Invalidation);

    fn outputs(&self) -> ProjectionOutputs<'_>;
}
