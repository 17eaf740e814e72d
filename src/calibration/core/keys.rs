//! Fit-parameter keys and their setters.
//!
//! Each [`FitKey`] names one fittable quantity. [`FitKey::apply`] writes a
//! value into [`ModelInputs`] and reports which [`Derived`] input it made
//! stale. Names are parsed when the registry is configured, so evaluation
//! never meets an unknown key.
use std::fmt;
use std::str::FromStr;

use crate::calibration::core::constants::{
    AGE_ADULT_MAX, AGE_ADULT_MIN, N_SEX, POP_CSW, POP_FSW, POP_MSM, POP_NEVER, POP_SPLIT,
    POP_TGW, POP_UNION, SEX_FEMALE, SEX_MALE,
};
use crate::calibration::core::state::{Derived, ModelInputs};
use crate::calibration::errors::CalibError;
use crate::transforms::partner_rates::{AGE_PARAM_MEAN, AGE_PARAM_SCALE};

/// Every fittable quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FitKey {
    SeedPrev,
    TransmitF2M,
    TransmitM2F,
    StiEffectNeg,
    StiEffectPos,
    ForcePwid,
    PartnerTrendF,
    PartnerTrendM,
    PartnerAgeMeanF,
    PartnerAgeMeanM,
    PartnerAgeScaleF,
    PartnerAgeScaleM,
    PartnerPopFsw,
    PartnerPopClient,
    PartnerPopMsm,
    PartnerPopTgw,
    AssortGen,
    AssortFsw,
    AssortMsm,
    AssortTgw,
    HivFrrLaf,
    AncssBias,
    AncrtBias,
    VarInflSite,
    VarInflCensus,
}

impl FitKey {
    pub const ALL: [FitKey; 25] = [
        FitKey::SeedPrev,
        FitKey::TransmitF2M,
        FitKey::TransmitM2F,
        FitKey::StiEffectNeg,
        FitKey::StiEffectPos,
        FitKey::ForcePwid,
        FitKey::PartnerTrendF,
        FitKey::PartnerTrendM,
        FitKey::PartnerAgeMeanF,
        FitKey::PartnerAgeMeanM,
        FitKey::PartnerAgeScaleF,
        FitKey::PartnerAgeScaleM,
        FitKey::PartnerPopFsw,
        FitKey::PartnerPopClient,
        FitKey::PartnerPopMsm,
        FitKey::PartnerPopTgw,
        FitKey::AssortGen,
        FitKey::AssortFsw,
        FitKey::AssortMsm,
        FitKey::AssortTgw,
        FitKey::HivFrrLaf,
        FitKey::AncssBias,
        FitKey::AncrtBias,
        FitKey::VarInflSite,
        FitKey::VarInflCensus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FitKey::SeedPrev => "seed.prev",
            FitKey::TransmitF2M => "transmit.f2m",
            FitKey::TransmitM2F => "transmit.m2f",
            FitKey::StiEffectNeg => "effect.sti.neg",
            FitKey::StiEffectPos => "effect.sti.pos",
            FitKey::ForcePwid => "force.pwid",
            FitKey::PartnerTrendF => "lt.partner.f",
            FitKey::PartnerTrendM => "lt.partner.m",
            FitKey::PartnerAgeMeanF => "partner.age.mean.f",
            FitKey::PartnerAgeMeanM => "partner.age.mean.m",
            FitKey::PartnerAgeScaleF => "partner.age.scale.f",
            FitKey::PartnerAgeScaleM => "partner.age.scale.m",
            FitKey::PartnerPopFsw => "partner.pop.fsw",
            FitKey::PartnerPopClient => "partner.pop.client",
            FitKey::PartnerPopMsm => "partner.pop.msm",
            FitKey::PartnerPopTgw => "partner.pop.tgw",
            FitKey::AssortGen => "assort.gen",
            FitKey::AssortFsw => "assort.fsw",
            FitKey::AssortMsm => "assort.msm",
            FitKey::AssortTgw => "assort.tgw",
            FitKey::HivFrrLaf => "hiv.frr.laf",
            FitKey::AncssBias => "ancss.bias",
            FitKey::AncrtBias => "ancrt.bias",
            FitKey::VarInflSite => "var.infl.site",
            FitKey::VarInflCensus => "var.infl.census",
        }
    }

    /// Write `x` into `inputs` and return the derived input it invalidates.
    ///
    /// - Partner age means are fitted on `[0, 1]` and mapped to `15 + 65·x`.
    /// - Assortativity values are fitted as proportions and stored as
    ///   percentages in the raw table.
    /// - Population-table rows are indexed without the never-had-sex group.
    pub fn apply(&self, inputs: &mut ModelInputs, x: f64) -> Derived {
        let age_span = (AGE_ADULT_MAX - AGE_ADULT_MIN) as f64;
        match self {
            FitKey::SeedPrev => {
                inputs.epi.seed_prev = x;
                Derived::EpidemicSeed
            }
            FitKey::TransmitF2M => {
                inputs.epi.transmission.f2m = x;
                Derived::Transmission
            }
            FitKey::TransmitM2F => {
                inputs.epi.transmission.m2f = x;
                Derived::Transmission
            }
            FitKey::StiEffectNeg => {
                inputs.epi.transmission.sti_neg = x;
                Derived::Transmission
            }
            FitKey::StiEffectPos => {
                inputs.epi.transmission.sti_pos = x;
                Derived::Transmission
            }
            FitKey::ForcePwid => {
                inputs.pwid.force.fill(x);
                Derived::PwidRisk
            }
            FitKey::PartnerTrendF => {
                inputs.partner_trend.row_mut(SEX_FEMALE).fill(x);
                Derived::PartnerRates
            }
            FitKey::PartnerTrendM => {
                inputs.partner_trend.row_mut(SEX_MALE).fill(x);
                Derived::PartnerRates
            }
            FitKey::PartnerAgeMeanF => {
                inputs.partner_age[[AGE_PARAM_MEAN, SEX_FEMALE]] =
                    age_span * x + AGE_ADULT_MIN as f64;
                Derived::PartnerRates
            }
            FitKey::PartnerAgeMeanM => {
                inputs.partner_age[[AGE_PARAM_MEAN, SEX_MALE]] =
                    age_span * x + AGE_ADULT_MIN as f64;
                Derived::PartnerRates
            }
            FitKey::PartnerAgeScaleF => {
                inputs.partner_age[[AGE_PARAM_SCALE, SEX_FEMALE]] = x;
                Derived::PartnerRates
            }
            FitKey::PartnerAgeScaleM => {
                inputs.partner_age[[AGE_PARAM_SCALE, SEX_MALE]] = x;
                Derived::PartnerRates
            }
            FitKey::PartnerPopFsw => {
                inputs.partner_pop_ratios[[POP_FSW - 1, SEX_FEMALE]] = x;
                Derived::PartnerRates
            }
            FitKey::PartnerPopClient => {
                inputs.partner_pop_ratios[[POP_CSW - 1, SEX_MALE]] = x;
                Derived::PartnerRates
            }
            FitKey::PartnerPopMsm => {
                inputs.partner_pop_ratios[[POP_MSM - 1, SEX_MALE]] = x;
                Derived::PartnerRates
            }
            FitKey::PartnerPopTgw => {
                inputs.partner_pop_ratios[[POP_TGW - 1, SEX_FEMALE]] = x;
                Derived::PartnerRates
            }
            FitKey::AssortGen => {
                for pop in [POP_NEVER, POP_UNION, POP_SPLIT] {
                    for sex in 0..N_SEX {
                        inputs.pop_prefs[[pop - 1, sex]] = 100.0 * x;
                    }
                }
                Derived::PopAssort
            }
            FitKey::AssortFsw => {
                for sex in 0..N_SEX {
                    inputs.pop_prefs[[POP_FSW - 1, sex]] = 100.0 * x;
                }
                Derived::PopAssort
            }
            FitKey::AssortMsm => {
                inputs.pop_prefs[[POP_MSM - 1, SEX_MALE]] = 100.0 * x;
                Derived::PopAssort
            }
            FitKey::AssortTgw => {
                inputs.pop_prefs[[POP_TGW - 1, SEX_FEMALE]] = 100.0 * x;
                Derived::PopAssort
            }
            FitKey::HivFrrLaf => {
                inputs.hiv_fertility.laf = x;
                Derived::HivFertility
            }
            FitKey::AncssBias => {
                inputs.anc.ancss_bias = x;
                Derived::AncLikelihood
            }
            FitKey::AncrtBias => {
                inputs.anc.ancrt_bias = x;
                Derived::AncLikelihood
            }
            FitKey::VarInflSite => {
                inputs.anc.varinfl_site = x;
                Derived::AncLikelihood
            }
            FitKey::VarInflCensus => {
                inputs.anc.varinfl_census = x;
                Derived::AncLikelihood
            }
        }
    }
}

impl FromStr for FitKey {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FitKey::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| CalibError::UnknownParameter { name: s.to_string() })
    }
}

impl fmt::Display for FitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::core::state::tests::sample_inputs;
    use approx::assert_relative_eq;

    #[test]
    fn names_round_trip_and_unknown_names_fail() {
        for key in FitKey::ALL {
            assert_eq!(key.name().parse::<FitKey>().unwrap(), key);
        }
        assert_eq!(
            "transmit.m2m".parse::<FitKey>(),
            Err(CalibError::UnknownParameter { name: "transmit.m2m".to_string() })
        );
    }

    #[test]
    // Purpose
    // -------
    // Setters write the documented cells and report the stale input.
    //
    // Given
    // -----
    // - Sample inputs.
    //
    // Expect
    // ------
    // - Partner mean age 0.5 maps to 47.5 years.
    // - assort.gen = 0.3 writes 30% into never/union/split for both sexes
    //   and leaves the FSW row untouched.
    // - TGW ratio lands in the female (gender identity) column.
    // - Trend broadcasts over every input year.
    fn setters_write_documented_cells() {
        // Arrange
        let mut inputs = sample_inputs();

        // Act
        let d_age = FitKey::PartnerAgeMeanM.apply(&mut inputs, 0.5);
        let d_assort = FitKey::AssortGen.apply(&mut inputs, 0.3);
        let d_tgw = FitKey::PartnerPopTgw.apply(&mut inputs, 2.5);
        let d_trend = FitKey::PartnerTrendF.apply(&mut inputs, 1.7);

        // Assert
        assert_eq!(d_age, Derived::PartnerRates);
        assert_relative_eq!(inputs.partner_age[[AGE_PARAM_MEAN, SEX_MALE]], 47.5);

        assert_eq!(d_assort, Derived::PopAssort);
        for row in [POP_NEVER - 1, POP_UNION - 1, POP_SPLIT - 1] {
            assert_relative_eq!(inputs.pop_prefs[[row, SEX_FEMALE]], 30.0, epsilon = 1e-12);
            assert_relative_eq!(inputs.pop_prefs[[row, SEX_MALE]], 30.0, epsilon = 1e-12);
        }
        assert_eq!(inputs.pop_prefs[[POP_FSW - 1, SEX_FEMALE]], 50.0);

        assert_eq!(d_tgw, Derived::PartnerRates);
        assert_eq!(inputs.partner_pop_ratios[[POP_TGW - 1, SEX_FEMALE]], 2.5);
        assert_eq!(inputs.partner_pop_ratios[[POP_TGW - 1, SEX_MALE]], 1.0);

        assert_eq!(d_trend, Derived::PartnerRates);
        assert!(inputs.partner_trend.row(SEX_FEMALE).iter().all(|&v| v == 1.7));
        assert!(inputs.partner_trend.row(SEX_MALE).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn scalar_setters_route_to_their_groups() {
        let mut inputs = sample_inputs();
        assert_eq!(FitKey::StiEffectPos.apply(&mut inputs, 3.0), Derived::Transmission);
        assert_eq!(inputs.epi.transmission.sti_pos, 3.0);
        assert_eq!(FitKey::SeedPrev.apply(&mut inputs, 0.01), Derived::EpidemicSeed);
        assert_eq!(FitKey::ForcePwid.apply(&mut inputs, 0.2), Derived::PwidRisk);
        assert!(inputs.pwid.force.iter().all(|&v| v == 0.2));
        assert_eq!(FitKey::HivFrrLaf.apply(&mut inputs, 0.7), Derived::HivFertility);
        assert_eq!(FitKey::VarInflSite.apply(&mut inputs, 0.05), Derived::AncLikelihood);
        assert_eq!(inputs.anc.varinfl_site, 0.05);
    }
}
