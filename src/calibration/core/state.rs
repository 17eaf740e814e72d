//! Versioned snapshot of every model input and the engine tensors derived
//! from them.
//!
//! ## Lifecycle
//! 1. [`ModelState::from_inputs`] validates the raw inputs and computes all
//!    derived tensors once.
//! 2. [`ModelState::share_all`] pushes everything into a freshly initialized
//!    engine.
//! 3. During calibration, fit-parameter setters write raw inputs through
//!    [`ModelState::apply`], which marks the affected [`Derived`] tensors
//!    dirty. [`ModelState::recompute`] rebuilds the dirty tensors,
//!    [`ModelState::push`] sends each one to the engine, and
//!    [`ModelState::commit`] clears the flags and bumps the version.
//!    [`ModelState::flush`] runs all three and invalidates the engine.
//!
//! Inputs that no fit parameter touches (mixing levels, STI prevalence, MTCT
//! rates) are computed once and only sent by `share_all`.
use std::collections::BTreeSet;

use ndarray::{s, Array1, Array2, Array3, Array4};
use tracing::trace;

use crate::calibration::core::constants::{YearWindow, N_SEX};
use crate::calibration::core::engine::{Invalidation, ProjectionEngine, TransmissionParams};
use crate::calibration::core::keys::FitKey;
use crate::calibration::core::observations::AncLikelihoodParams;
use crate::calibration::errors::{CalibError, CalibResult};
use crate::transforms::{
    age_mixing, mixing_levels, mtct_rates, partner_rates, pop_assortativity, sti_prevalence,
    AgePreferences, MtctInputs, TransformError,
};

/// Engine inputs that can go stale when a raw input changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Derived {
    Transmission,
    EpidemicSeed,
    PartnerRates,
    AgeMixing,
    PopAssort,
    PwidRisk,
    HivFertility,
    /// Not an engine tensor: the ANC evaluator's nuisance parameters.
    AncLikelihood,
}

/// Scalar epidemiological inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpiParams {
    pub transmission: TransmissionParams,
    /// Calendar year in which the epidemic is seeded.
    pub seed_year: i32,
    /// HIV prevalence at seeding.
    pub seed_prev: f64,
}

/// HIV fertility rate ratios.
///
/// - `age`: `(input year, age band)` ratios by calendar year.
/// - `cd4`: ratio by CD4 stage off ART.
/// - `art`: ratio by ART duration.
/// - `laf`: local adjustment factor applied to `age` and `art`.
#[derive(Debug, Clone, PartialEq)]
pub struct HivFertility {
    pub age: Array2<f64>,
    pub cd4: Array1<f64>,
    pub art: Array1<f64>,
    pub laf: f64,
}

impl HivFertility {
    /// Age ratios for the projection window and ART ratios, both scaled by
    /// the local adjustment factor.
    pub fn scaled(&self, years: YearWindow) -> CalibResult<(Array2<f64>, Array1<f64>)> {
        let rows = years.input_rows(self.age.nrows())?;
        let age = &self.age.slice(s![rows, ..]) * self.laf;
        let art = &self.art * self.laf;
        Ok((age, art))
    }
}

/// Injection-driven HIV risk among people who inject drugs.
///
/// - `force`: `(input year, sex)` force of infection.
/// - `needle_sharing`: `(input year,)` needle-sharing prevalence.
#[derive(Debug, Clone, PartialEq)]
pub struct PwidRisk {
    pub force: Array2<f64>,
    pub needle_sharing: Array1<f64>,
}

/// Raw model inputs, laid out as they are tabulated. Year-indexed tables
/// start at [`INPUT_FIRST_YEAR`](crate::calibration::core::constants::INPUT_FIRST_YEAR).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputs {
    pub years: YearWindow,
    pub epi: EpiParams,
    /// `(sex, input year)` partnership trend.
    pub partner_trend: Array2<f64>,
    /// `(2, sex)` mean age and Beta concentration.
    pub partner_age: Array2<f64>,
    /// `(7, sex)` population rate ratios.
    pub partner_pop_ratios: Array2<f64>,
    pub age_prefs: AgePreferences,
    /// `(7, sex)` population assortativity in percent.
    pub pop_prefs: Array2<f64>,
    /// `12 × 12` raw mixing levels.
    pub mix_levels: Array2<i32>,
    pub pwid: PwidRisk,
    /// `(input year, sex, pop)` STI prevalence trend.
    pub sti_trend: Array3<f64>,
    /// `(sex, pop, 2)` STI age parameters.
    pub sti_age: Array3<f64>,
    pub mtct: MtctInputs,
    pub hiv_fertility: HivFertility,
    pub anc: AncLikelihoodParams,
}

/// Raw inputs plus derived tensors, dirty flags and a version counter.
#[derive(Debug, Clone)]
pub struct ModelState {
    inputs: ModelInputs,
    seed_index: usize,
    partner_rate: Array4<f64>,
    age_mixing: Array4<f64>,
    pop_assort: Array2<f64>,
    mix_levels: Array4<i32>,
    sti_prev: Array4<f64>,
    mtct: Array3<f64>,
    dirty: BTreeSet<Derived>,
    version: u64,
}

impl ModelState {
    /// Validate `inputs` and compute every derived tensor.
    ///
    /// # Errors
    /// - [`CalibError::SeedYearOutsideWindow`] if the seed year is not
    ///   projected.
    /// - [`CalibError::Transform`] for malformed tables or year-indexed
    ///   inputs that do not cover the window.
    pub fn from_inputs(inputs: ModelInputs) -> CalibResult<Self> {
        let years = inputs.years;
        let seed_index = seed_index(&inputs)?;
        check_pwid(&inputs.pwid, years)?;
        inputs.hiv_fertility.scaled(years)?;

        let partner_rate = partner_rates(
            inputs.partner_trend.view(),
            inputs.partner_age.view(),
            inputs.partner_pop_ratios.view(),
            years,
        )?;
        let age_mixing = age_mixing(&inputs.age_prefs)?;
        let pop_assort = pop_assortativity(inputs.pop_prefs.view())?;
        let mix_levels = mixing_levels(inputs.mix_levels.view())?;
        let sti_prev = sti_prevalence(inputs.sti_trend.view(), inputs.sti_age.view(), years)?;
        let mtct = mtct_rates(&inputs.mtct)?;

        Ok(Self {
            inputs,
            seed_index,
            partner_rate,
            age_mixing,
            pop_assort,
            mix_levels,
            sti_prev,
            mtct,
            dirty: BTreeSet::new(),
            version: 0,
        })
    }

    pub fn inputs(&self) -> &ModelInputs {
        &self.inputs
    }

    pub fn years(&self) -> YearWindow {
        self.inputs.years
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn partner_rate(&self) -> &Array4<f64> {
        &self.partner_rate
    }

    pub fn age_mixing(&self) -> &Array4<f64> {
        &self.age_mixing
    }

    pub fn pop_assort(&self) -> &Array2<f64> {
        &self.pop_assort
    }

    pub fn is_dirty(&self, derived: Derived) -> bool {
        self.dirty.contains(&derived)
    }

    /// Dirty tensors in a fixed order.
    pub fn dirty(&self) -> Vec<Derived> {
        self.dirty.iter().copied().collect()
    }

    pub fn mark(&mut self, derived: Derived) {
        self.dirty.insert(derived);
    }

    /// Write one fit-parameter value and mark what it invalidates.
    pub fn apply(&mut self, key: FitKey, x: f64) {
        let derived = key.apply(&mut self.inputs, x);
        self.mark(derived);
    }

    pub fn set_age_prefs(&mut self, prefs: AgePreferences) {
        self.inputs.age_prefs = prefs;
        self.mark(Derived::AgeMixing);
    }

    pub fn set_pop_prefs(&mut self, prefs: Array2<f64>) {
        self.inputs.pop_prefs = prefs;
        self.mark(Derived::PopAssort);
    }

    pub fn set_pop_ratios(&mut self, ratios: Array2<f64>) {
        self.inputs.partner_pop_ratios = ratios;
        self.mark(Derived::PartnerRates);
    }

    /// Rebuild every dirty derived tensor from the raw inputs.
    ///
    /// Flags stay set until [`ModelState::commit`]. On error the previous
    /// tensor is kept.
    pub fn recompute(&mut self) -> CalibResult<()> {
        let years = self.inputs.years;
        for derived in self.dirty() {
            match derived {
                Derived::PartnerRates => {
                    self.partner_rate = partner_rates(
                        self.inputs.partner_trend.view(),
                        self.inputs.partner_age.view(),
                        self.inputs.partner_pop_ratios.view(),
                        years,
                    )?;
                }
                Derived::AgeMixing => self.age_mixing = age_mixing(&self.inputs.age_prefs)?,
                Derived::PopAssort => {
                    self.pop_assort = pop_assortativity(self.inputs.pop_prefs.view())?
                }
                Derived::EpidemicSeed => self.seed_index = seed_index(&self.inputs)?,
                Derived::Transmission
                | Derived::PwidRisk
                | Derived::HivFertility
                | Derived::AncLikelihood => {}
            }
        }
        Ok(())
    }

    /// Send one derived input to the engine. [`Derived::AncLikelihood`] is
    /// not an engine input and is ignored here.
    pub fn push<E: ProjectionEngine + ?Sized>(
        &self, derived: Derived, engine: &mut E,
    ) -> CalibResult<()> {
        let years = self.inputs.years;
        match derived {
            Derived::Transmission => engine.init_transmission(&self.inputs.epi.transmission),
            Derived::EpidemicSeed => {
                engine.init_epidemic_seed(self.seed_index, self.inputs.epi.seed_prev)
            }
            Derived::PartnerRates => engine.share_partner_rate(self.partner_rate.view()),
            Derived::AgeMixing => engine.share_age_mixing(self.age_mixing.view()),
            Derived::PopAssort => engine.share_pop_assort(self.pop_assort.view()),
            Derived::PwidRisk => {
                let rows = years.input_rows(self.inputs.pwid.force.nrows())?;
                let pwid = &self.inputs.pwid;
                engine.share_pwid_risk(
                    pwid.force.slice(s![rows.clone(), ..]),
                    pwid.needle_sharing.slice(s![rows]),
                )
            }
            Derived::HivFertility => {
                let (age, art) = self.inputs.hiv_fertility.scaled(years)?;
                engine.init_hiv_fertility(age.view(), self.inputs.hiv_fertility.cd4.view(), art.view())
            }
            Derived::AncLikelihood => Ok(()),
        }
    }

    /// Recompute and push every dirty input, invalidate the engine from the
    /// start, and commit.
    ///
    /// Returns whether the ANC nuisance parameters changed; they are not an
    /// engine input, so the caller forwards them.
    pub fn flush<E: ProjectionEngine + ?Sized>(&mut self, engine: &mut E) -> CalibResult<bool> {
        self.recompute()?;
        for derived in self.dirty() {
            trace!(?derived, version = self.version, "pushing derived input");
            self.push(derived, &mut *engine)?;
        }
        engine.invalidate(Invalidation::FromStart);
        let anc_changed = self.is_dirty(Derived::AncLikelihood);
        self.commit();
        Ok(anc_changed)
    }

    /// Clear the dirty flags and advance the version.
    pub fn commit(&mut self) {
        self.dirty.clear();
        self.version += 1;
    }

    /// Push every input into a freshly initialized engine.
    pub fn share_all<E: ProjectionEngine + ?Sized>(&self, engine: &mut E) -> CalibResult<()> {
        engine.init_mixing_matrix(self.mix_levels.view())?;
        engine.init_sti_prev(self.sti_prev.view())?;
        engine.init_mtct_rates(self.mtct.view())?;
        for derived in [
            Derived::Transmission,
            Derived::EpidemicSeed,
            Derived::PartnerRates,
            Derived::AgeMixing,
            Derived::PopAssort,
            Derived::PwidRisk,
            Derived::HivFertility,
        ] {
            self.push(derived, &mut *engine)?;
        }
        Ok(())
    }
}

fn seed_index(inputs: &ModelInputs) -> CalibResult<usize> {
    let years = inputs.years;
    let year = inputs.epi.seed_year;
    years.index_of(year).ok_or(CalibError::SeedYearOutsideWindow {
        year,
        first: years.first,
        last: years.last,
    })
}

fn check_pwid(pwid: &PwidRisk, years: YearWindow) -> CalibResult<()> {
    if pwid.force.ncols() != N_SEX || pwid.force.nrows() != pwid.needle_sharing.len() {
        return Err(TransformError::ShapeMismatch {
            input: "PWID risk",
            expected: vec![pwid.needle_sharing.len(), N_SEX],
            found: pwid.force.shape().to_vec(),
        }
        .into());
    }
    years.input_rows(pwid.force.nrows())?;
    Ok(())
}
