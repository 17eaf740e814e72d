//! Partnership rates by year, sex, adult age, and behavioral risk group.
//!
//! The rate tensor is the outer product of three factors per sex:
//! a calendar-year trend, a Beta-shaped age pattern, and a population rate
//! ratio re-indexed into engine layout.
use ndarray::{s, Array2, Array4, ArrayView2};
use statrs::distribution::ContinuousCDF;

use crate::calibration::core::constants::{
    YearWindow, AGE_ADULT_MAX, AGE_ADULT_MIN, N_AGE_ADULT, N_POP, N_POP_RAW, N_SEX, POP_FSW,
    POP_MSM, POP_NEVER, POP_TGW, SEX_FEMALE, SEX_MALE,
};
use crate::transforms::distributions::beta;
use crate::transforms::errors::{TransformError, TransformResult};

/// Row of the age-parameter table holding the mean age (years).
pub const AGE_PARAM_MEAN: usize = 0;
/// Row of the age-parameter table holding the Beta concentration.
pub const AGE_PARAM_SCALE: usize = 1;

/// Partner rates `(year, sex, age, pop)` for the projection window.
///
/// Parameters
/// ----------
/// - `trend`: `(sex, input year)` partnership trend, starting in 1970.
/// - `age_params`: `(2, sex)`; row [`AGE_PARAM_MEAN`] holds the mean age,
///   row [`AGE_PARAM_SCALE`] the Beta concentration.
/// - `pop_ratios`: `(7, sex)` raw rate ratios, never-had-sex omitted and TGW
///   stored in the female (gender identity) column.
/// - `years`: projection window.
///
/// Errors
/// ------
/// - [`TransformError::ShapeMismatch`] for misshapen tables.
/// - [`TransformError::InputYearsTooShort`] if `trend` does not cover the
///   window.
/// - [`TransformError::InvalidDistribution`] if a mean age falls outside
///   `(15, 80)` or a concentration is not positive.
pub fn partner_rates(
    trend: ArrayView2<f64>, age_params: ArrayView2<f64>, pop_ratios: ArrayView2<f64>,
    years: YearWindow,
) -> TransformResult<Array4<f64>> {
    if trend.nrows() != N_SEX {
        return Err(TransformError::ShapeMismatch {
            input: "partner trend",
            expected: vec![N_SEX, years.num_years()],
            found: trend.shape().to_vec(),
        });
    }
    let rows = years.input_rows(trend.ncols())?;
    let ages = partner_age_ratios(age_params)?;
    let pops = augment_pop_ratios(pop_ratios)?;

    let mut rates = Array4::<f64>::zeros((years.num_years(), N_SEX, N_AGE_ADULT, N_POP));
    for (y, col) in rows.enumerate() {
        for sex in 0..N_SEX {
            let t = trend[[sex, col]];
            let mut block = rates.slice_mut(s![y, sex, .., ..]);
            for a in 0..N_AGE_ADULT {
                let ta = t * ages[[sex, a]];
                for r in 0..N_POP {
                    block[[a, r]] = ta * pops[[r, sex]];
                }
            }
        }
    }
    Ok(rates)
}

/// Age rate ratios `(sex, age)` from a Beta distribution on standardized
/// age `(a − 15) / 65`.
///
/// Each age bin holds the CDF difference between consecutive ages; the
/// terminal age bin (80+) is zero.
pub fn partner_age_ratios(age_params: ArrayView2<f64>) -> TransformResult<Array2<f64>> {
    if age_params.shape() != [2, N_SEX] {
        return Err(TransformError::ShapeMismatch {
            input: "partner age parameters",
            expected: vec![2, N_SEX],
            found: age_params.shape().to_vec(),
        });
    }
    let span = (AGE_ADULT_MAX - AGE_ADULT_MIN) as f64;
    let mut ratios = Array2::<f64>::zeros((N_SEX, N_AGE_ADULT));
    for sex in 0..N_SEX {
        let mean = (age_params[[AGE_PARAM_MEAN, sex]] - AGE_ADULT_MIN as f64) / span;
        let size = age_params[[AGE_PARAM_SCALE, sex]];
        let dist = beta(size * mean, size * (1.0 - mean))?;

        let mut prev = dist.cdf(0.0);
        for a in 0..N_AGE_ADULT - 1 {
            let next = dist.cdf((a + 1) as f64 / span);
            ratios[[sex, a]] = next - prev;
            prev = next;
        }
    }
    Ok(ratios)
}

/// Re-index raw population rate ratios `(7, sex)` into engine layout
/// `(pop, sex)`: a zero never-had-sex row, and TGW moved from the female
/// column into the male column.
pub fn augment_pop_ratios(pop_ratios: ArrayView2<f64>) -> TransformResult<Array2<f64>> {
    if pop_ratios.shape() != [N_POP_RAW, N_SEX] {
        return Err(TransformError::ShapeMismatch {
            input: "population rate ratios",
            expected: vec![N_POP_RAW, N_SEX],
            found: pop_ratios.shape().to_vec(),
        });
    }
    let mut aug = Array2::<f64>::zeros((N_POP, N_SEX));
    aug.slice_mut(s![POP_NEVER..=POP_FSW, SEX_FEMALE])
        .assign(&pop_ratios.slice(s![0..POP_FSW, SEX_FEMALE]));
    aug.slice_mut(s![POP_NEVER..=POP_MSM, SEX_MALE])
        .assign(&pop_ratios.slice(s![0..POP_MSM, SEX_MALE]));
    aug[[POP_TGW, SEX_MALE]] = pop_ratios[[POP_TGW - 1, SEX_FEMALE]];
    Ok(aug)
}
