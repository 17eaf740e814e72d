//! Prevalence of non-HIV sexually transmitted infections by year, sex, age,
//! and risk group.
//!
//! Each (sex, pop) cell combines a calendar trend with a Beta-shaped age
//! relative risk normalized to one at age 27.5, then rescales on the odds
//! scale so that prevalence stays inside `[0, 1]`.
use ndarray::{Array4, ArrayView3};
use statrs::distribution::Continuous;

use crate::calibration::core::constants::{
    YearWindow, AGE_ADULT_MAX, AGE_ADULT_MIN, N_AGE_ADULT, N_POP, N_SEX, POP_NEVER,
};
use crate::transforms::distributions::beta;
use crate::transforms::errors::{TransformError, TransformResult};

/// Age at which the age relative risk equals one.
pub const STI_REFERENCE_AGE: f64 = 27.5;

/// STI prevalence `(year, sex, age, pop)` for the projection window.
///
/// Parameters
/// ----------
/// - `trend`: `(input year, sex, pop)` prevalence at the reference age.
/// - `age`: `(sex, pop, 2)`; `[.., .., 0]` is the peak-mass mean age and
///   `[.., .., 1]` the Beta concentration.
/// - `years`: projection window.
///
/// For age `a` (midpoint `a + 0.5`) with relative risk `r` and trend `t`,
/// `p = t·r / (1 − t + t·r)`. The 80+ age bin and the never-had-sex group
/// stay zero.
pub fn sti_prevalence(
    trend: ArrayView3<f64>, age: ArrayView3<f64>, years: YearWindow,
) -> TransformResult<Array4<f64>> {
    let (_, trend_sex, trend_pop) = trend.dim();
    if trend_sex != N_SEX || trend_pop != N_POP {
        return Err(TransformError::ShapeMismatch {
            input: "STI trend",
            expected: vec![years.num_years(), N_SEX, N_POP],
            found: trend.shape().to_vec(),
        });
    }
    if age.shape() != [N_SEX, N_POP, 2] {
        return Err(TransformError::ShapeMismatch {
            input: "STI age pattern",
            expected: vec![N_SEX, N_POP, 2],
            found: age.shape().to_vec(),
        });
    }
    let rows = years.input_rows(trend.shape()[0])?;

    let span = (AGE_ADULT_MAX - AGE_ADULT_MIN) as f64;
    let ref_x = (STI_REFERENCE_AGE - AGE_ADULT_MIN as f64) / span;

    let mut sti = Array4::<f64>::zeros((years.num_years(), N_SEX, N_AGE_ADULT, N_POP));
    let mut ratio = [0.0; N_AGE_ADULT - 1];
    for sex in 0..N_SEX {
        for pop in POP_NEVER..N_POP {
            let mean = (age[[sex, pop, 0]] - AGE_ADULT_MIN as f64) / span;
            let size = age[[sex, pop, 1]];
            let dist = beta(1.0 + mean * size, 1.0 + (1.0 - mean) * size)?;
            let ref_pdf = dist.pdf(ref_x);
            for (a, r) in ratio.iter_mut().enumerate() {
                *r = dist.pdf((a as f64 + 0.5) / span) / ref_pdf;
            }

            for (y, row) in rows.clone().enumerate() {
                let t = trend[[row, sex, pop]];
                for (a, &r) in ratio.iter().enumerate() {
                    sti[[y, sex, a, pop]] = t * r / (1.0 - t + t * r);
                }
            }
        }
    }
    Ok(sti)
}
