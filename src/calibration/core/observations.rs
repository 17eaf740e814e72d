//! Data-likelihood contracts and model-implied estimates.
//!
//! - [`AncLikelihood`]: antenatal-clinic prevalence model, with nuisance
//!   parameters set by calibration.
//! - [`SurveyLikelihood`]: household-survey prevalence model; exposes the
//!   observation template whose cells the model must estimate.
//! - [`anc_prevalence`] / [`survey_prevalence`]: turn engine outputs into
//!   the estimate vectors the two models consume.
use std::ops::Range;
use std::str::FromStr;

use ndarray::{s, Array1, ArrayView1};

use crate::calibration::core::constants::{
    YearWindow, AGE_ADULT_MAX, AGE_ADULT_MIN, N_AGE_ADULT, N_POP, N_SEX, N_SEX_MC, POP_FSW,
    POP_MSM, SEX_FEMALE, SEX_MALE_C, SEX_MALE_U,
};
use crate::calibration::core::engine::ProjectionOutputs;
use crate::calibration::errors::{CalibError, CalibResult};

/// Nuisance parameters of the ANC likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AncLikelihoodParams {
    /// Bias of sentinel-surveillance sites relative to the population.
    pub ancss_bias: f64,
    /// Calibration offset of routine-testing data.
    pub ancrt_bias: f64,
    /// Extra variance for non-sampling error, site level.
    pub varinfl_site: f64,
    /// Extra variance for non-sampling error, census level.
    pub varinfl_census: f64,
}

/// Log-likelihood of ANC prevalence data given model estimates by year.
pub trait AncLikelihood {
    fn set_parameters(&mut self, params: &AncLikelihoodParams);
    fn likelihood(&self, estimates: ArrayView1<f64>) -> CalibResult<f64>;
}

/// Log-likelihood of survey prevalence data given one estimate per
/// template row.
pub trait SurveyLikelihood {
    fn template(&self) -> &[SurveyObservation];
    fn likelihood(&self, estimates: ArrayView1<f64>) -> CalibResult<f64>;
}

/// Sex cells covered by a survey observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SexSelector {
    All,
    Female,
    /// Uncircumcised and circumcised males.
    Male,
}

impl SexSelector {
    /// Index range along the `N_SEX_MC` axis.
    pub fn range(&self) -> Range<usize> {
        match self {
            SexSelector::All => 0..N_SEX_MC,
            SexSelector::Female => SEX_FEMALE..SEX_FEMALE + 1,
            SexSelector::Male => SEX_MALE_U..SEX_MALE_C + 1,
        }
    }
}

impl FromStr for SexSelector {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(SexSelector::All),
            "Female" => Ok(SexSelector::Female),
            "Male" => Ok(SexSelector::Male),
            _ => Err(CalibError::InvalidSelector { kind: "sex", value: s.to_string() }),
        }
    }
}

/// Risk populations covered by a survey observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PopSelector {
    All,
    Fsw,
    Msm,
}

impl PopSelector {
    /// Index range along the `N_POP` axis.
    pub fn range(&self) -> Range<usize> {
        match self {
            PopSelector::All => 0..N_POP,
            PopSelector::Fsw => POP_FSW..POP_FSW + 1,
            PopSelector::Msm => POP_MSM..POP_MSM + 1,
        }
    }
}

impl FromStr for PopSelector {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(PopSelector::All),
            "FSW" => Ok(PopSelector::Fsw),
            "MSM" => Ok(PopSelector::Msm),
            _ => Err(CalibError::InvalidSelector { kind: "population", value: s.to_string() }),
        }
    }
}

/// One survey prevalence cell: a year, sex and population selection, and an
/// inclusive adult age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurveyObservation {
    pub year: i32,
    pub sex: SexSelector,
    pub pop: PopSelector,
    pub age_min: usize,
    pub age_max: usize,
}

impl SurveyObservation {
    /// Validated observation.
    ///
    /// # Errors
    /// [`CalibError::InvalidSurveyRow`] (reported at index 0) unless
    /// `15 ≤ age_min ≤ age_max ≤ 80`.
    pub fn new(
        year: i32, sex: SexSelector, pop: PopSelector, age_min: usize, age_max: usize,
    ) -> CalibResult<Self> {
        let obs = Self { year, sex, pop, age_min, age_max };
        obs.check_ages(0)?;
        Ok(obs)
    }

    fn check_ages(&self, index: usize) -> CalibResult<()> {
        if self.age_min < AGE_ADULT_MIN || self.age_max > AGE_ADULT_MAX || self.age_min > self.age_max
        {
            return Err(CalibError::InvalidSurveyRow {
                index,
                reason: format!(
                    "age range {}..={} must lie within {AGE_ADULT_MIN}..={AGE_ADULT_MAX}",
                    self.age_min, self.age_max
                ),
            });
        }
        Ok(())
    }

    fn age_range(&self) -> Range<usize> {
        self.age_min - AGE_ADULT_MIN..self.age_max - AGE_ADULT_MIN + 1
    }
}

/// Check that every template row lies inside the projection window and has
/// a valid age range.
pub fn validate_template(template: &[SurveyObservation], years: YearWindow) -> CalibResult<()> {
    for (index, obs) in template.iter().enumerate() {
        obs.check_ages(index)?;
        if years.index_of(obs.year).is_none() {
            return Err(CalibError::InvalidSurveyRow {
                index,
                reason: format!("year {} outside {}..={}", obs.year, years.first, years.last),
            });
        }
    }
    Ok(())
}

/// Check that the engine outputs cover `years` with the documented layout.
///
/// # Errors
/// [`CalibError::OutputShape`] naming the first mismatched output.
pub fn check_outputs(outputs: &ProjectionOutputs<'_>, years: YearWindow) -> CalibResult<()> {
    let y = years.num_years();
    let expected: [(&'static str, &[usize], Vec<usize>); 4] = [
        ("pop_adult_neg", outputs.pop_adult_neg.shape(), vec![y, N_SEX_MC, N_AGE_ADULT, N_POP]),
        (
            "pop_adult_hiv",
            &outputs.pop_adult_hiv.shape()[..4],
            vec![y, N_SEX_MC, N_AGE_ADULT, N_POP],
        ),
        ("births", outputs.births.shape(), vec![y, N_SEX]),
        ("births_exposed", outputs.births_exposed.shape(), vec![y]),
    ];
    for (output, found, expected) in expected {
        if found != expected.as_slice() {
            return Err(CalibError::OutputShape { output, expected, found: found.to_vec() });
        }
    }
    Ok(())
}

/// ANC prevalence by year: HIV-exposed births over total births.
///
/// # Errors
/// [`CalibError::DegenerateEstimate`] for a year with no births.
pub fn anc_prevalence(outputs: &ProjectionOutputs<'_>) -> CalibResult<Array1<f64>> {
    if outputs.births.nrows() != outputs.births_exposed.len() {
        return Err(CalibError::OutputShape {
            output: "births",
            expected: vec![outputs.births_exposed.len(), N_SEX],
            found: outputs.births.shape().to_vec(),
        });
    }
    let mut est = Array1::<f64>::zeros(outputs.births_exposed.len());
    for (t, v) in est.iter_mut().enumerate() {
        let total = outputs.births.row(t).sum();
        if !(total > 0.0) {
            return Err(CalibError::DegenerateEstimate { what: "ANC prevalence", index: t });
        }
        *v = outputs.births_exposed[t] / total;
    }
    Ok(est)
}

/// Model prevalence for each template row: HIV-positive adults over all
/// adults in the selected year, sex, age, and population cells. Output
/// shapes are assumed to have passed [`check_outputs`].
///
/// # Errors
/// - [`CalibError::InvalidSurveyRow`] for rows outside the window.
/// - [`CalibError::DegenerateEstimate`] if a selected cell is empty.
pub fn survey_prevalence(
    outputs: &ProjectionOutputs<'_>, template: &[SurveyObservation], years: YearWindow,
) -> CalibResult<Array1<f64>> {
    let mut est = Array1::<f64>::zeros(template.len());
    for (index, obs) in template.iter().enumerate() {
        let t = years.index_of(obs.year).ok_or_else(|| CalibError::InvalidSurveyRow {
            index,
            reason: format!("year {} outside the projection", obs.year),
        })?;
        let (sex, age, pop) = (obs.sex.range(), obs.age_range(), obs.pop.range());
        let hiv = outputs
            .pop_adult_hiv
            .slice(s![t, sex.clone(), age.clone(), pop.clone(), .., ..])
            .sum();
        let neg = outputs.pop_adult_neg.slice(s![t, sex, age, pop]).sum();
        let total = hiv + neg;
        if !(total > 0.0) {
            return Err(CalibError::DegenerateEstimate { what: "survey prevalence", index });
        }
        est[index] = hiv / total;
    }
    Ok(est)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::core::constants::{N_DTX, N_HIV_ADULT};
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, Array4, Array6};

    struct Outputs {
        neg: Array4<f64>,
        hiv: Array6<f64>,
        births: Array2<f64>,
        exposed: Array1<f64>,
        inf: Array4<f64>,
    }

    impl Outputs {
        fn uniform(years: usize) -> Self {
            Self {
                neg: Array4::from_elem((years, N_SEX_MC, N_AGE_ADULT, N_POP), 9.0),
                hiv: Array6::from_elem(
                    (years, N_SEX_MC, N_AGE_ADULT, N_POP, N_HIV_ADULT, N_DTX),
                    1.0 / (N_HIV_ADULT * N_DTX) as f64,
                ),
                births: Array2::from_elem((years, N_SEX), 50.0),
                exposed: Array1::from_elem(years, 5.0),
                inf: Array4::zeros((years, N_SEX_MC, 81, N_POP)),
            }
        }

        fn view(&self) -> ProjectionOutputs<'_> {
            ProjectionOutputs {
                pop_adult_neg: self.neg.view(),
                pop_adult_hiv: self.hiv.view(),
                births: self.births.view(),
                births_exposed: self.exposed.view(),
                new_infections: self.inf.view(),
            }
        }
    }

    #[test]
    fn selectors_parse_and_cover_the_documented_ranges() {
        assert_eq!("All".parse::<SexSelector>().unwrap().range(), 0..3);
        assert_eq!("Female".parse::<SexSelector>().unwrap().range(), 0..1);
        assert_eq!("Male".parse::<SexSelector>().unwrap().range(), 1..3);
        assert_eq!("All".parse::<PopSelector>().unwrap().range(), 0..8);
        assert_eq!("FSW".parse::<PopSelector>().unwrap().range(), 5..6);
        assert_eq!("MSM".parse::<PopSelector>().unwrap().range(), 6..7);
        assert!(matches!("Both".parse::<SexSelector>(), Err(CalibError::InvalidSelector { .. })));
        assert!(matches!("PWID".parse::<PopSelector>(), Err(CalibError::InvalidSelector { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Model estimates are ratios of the selected engine output cells.
    //
    // Given
    // -----
    // - Every adult cell holds 9 HIV-negative and 1 HIV-positive person.
    // - 100 births per year of which 5 are HIV-exposed.
    //
    // Expect
    // ------
    // - Survey prevalence 0.1 for any selection; ANC prevalence 0.05.
    fn estimates_are_cell_ratios() {
        // Arrange
        let years = YearWindow::new(1990, 1994).unwrap();
        let out = Outputs::uniform(years.num_years());
        let template = vec![
            SurveyObservation::new(1992, SexSelector::Female, PopSelector::All, 15, 49).unwrap(),
            SurveyObservation::new(1994, SexSelector::Male, PopSelector::Msm, 20, 24).unwrap(),
        ];

        // Act
        let survey = survey_prevalence(&out.view(), &template, years).unwrap();
        let anc = anc_prevalence(&out.view()).unwrap();

        // Assert
        assert_eq!(survey.len(), 2);
        survey.iter().for_each(|&p| assert_relative_eq!(p, 0.1, epsilon = 1e-12));
        assert_eq!(anc.len(), 5);
        anc.iter().for_each(|&p| assert_relative_eq!(p, 0.05, epsilon = 1e-12));
    }

    #[test]
    // Purpose
    // -------
    // Empty denominators are errors, not NaN estimates.
    fn empty_cells_are_degenerate() {
        let years = YearWindow::new(1990, 1991).unwrap();
        let mut out = Outputs::uniform(years.num_years());
        out.births.row_mut(1).fill(0.0);
        assert_eq!(
            anc_prevalence(&out.view()),
            Err(CalibError::DegenerateEstimate { what: "ANC prevalence", index: 1 })
        );

        out.neg.fill(0.0);
        out.hiv.fill(0.0);
        let template =
            vec![SurveyObservation::new(1990, SexSelector::All, PopSelector::Fsw, 15, 80).unwrap()];
        assert!(matches!(
            survey_prevalence(&out.view(), &template, years),
            Err(CalibError::DegenerateEstimate { index: 0, .. })
        ));
    }

    #[test]
    fn short_outputs_are_reported_by_name() {
        let years = YearWindow::new(1990, 1994).unwrap();
        let out = Outputs::uniform(4);
        assert!(matches!(
            check_outputs(&out.view(), years),
            Err(CalibError::OutputShape { output: "pop_adult_neg", .. })
        ));
        assert!(check_outputs(&Outputs::uniform(5).view(), years).is_ok());
    }

    #[test]
    fn template_rows_are_validated() {
        assert!(SurveyObservation::new(2000, SexSelector::All, PopSelector::All, 14, 49).is_err());
        assert!(SurveyObservation::new(2000, SexSelector::All, PopSelector::All, 30, 20).is_err());

        let years = YearWindow::new(1990, 2000).unwrap();
        let ok = SurveyObservation::new(1995, SexSelector::All, PopSelector::All, 15, 80).unwrap();
        let late = SurveyObservation { year: 2005, ..ok };
        assert!(validate_template(&[ok], years).is_ok());
        assert!(matches!(
            validate_template(&[ok, late], years),
            Err(CalibError::InvalidSurveyRow { index: 1, .. })
        ));
    }
}
