//! Age-mixing preferences between partners.
//!
//! Opposite-sex age differences (male age minus female age) follow a shifted
//! Fisk distribution fitted to a mean and variance; male-male differences
//! follow a centered normal. Each partner-age row is normalized to sum to one.
use ndarray::{s, Array1, Array2, Array4};
use statrs::distribution::ContinuousCDF;
use tracing::warn;

use crate::calibration::core::constants::{N_AGE_ADULT, N_SEX, SEX_FEMALE, SEX_MALE};
use crate::transforms::distributions::{normal, Fisk};
use crate::transforms::errors::{TransformError, TransformResult};

/// Partner age-difference moments.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgePreferences {
    /// Mean of (male age − female age) in opposite-sex partnerships.
    pub diff_mean: f64,
    /// Variance of that difference.
    pub diff_var: f64,
    /// Variance of the age difference in male-male partnerships.
    pub same_sex_var: f64,
}

impl AgePreferences {
    pub fn new(diff_mean: f64, diff_var: f64, same_sex_var: f64) -> Self {
        Self { diff_mean, diff_var, same_sex_var }
    }
}

/// Mixing matrix `(sex, age, partner sex, partner age)`.
///
/// Rows for females seeking males, males seeking females, and males seeking
/// males each sum to one. Female-female mixing stays zero, as does every row
/// for the terminal 80+ age. A row with no mass is left zero and logged.
///
/// Errors
/// ------
/// - [`TransformError::InvalidAgePreference`] / [`TransformError::RootNotConverged`]
///   from the Fisk fit.
/// - [`TransformError::InvalidAgePreference`] for a non-positive same-sex
///   variance.
pub fn age_mixing(prefs: &AgePreferences) -> TransformResult<Array4<f64>> {
    let fisk = Fisk::fit_age_difference(prefs.diff_mean, prefs.diff_var)?;
    if !(prefs.same_sex_var.is_finite() && prefs.same_sex_var > 0.0) {
        return Err(TransformError::InvalidAgePreference {
            name: "same-sex age difference variance",
            value: prefs.same_sex_var,
            reason: "must be finite and positive",
        });
    }
    let same = normal(0.0, prefs.same_sex_var.sqrt())?;

    let oppo_raw = difference_increments(|d| fisk.cdf(d));
    let same_raw = difference_increments(|d| same.cdf(d));

    let mut mix = Array4::<f64>::zeros((N_SEX, N_AGE_ADULT, N_SEX, N_AGE_ADULT));
    for b in 0..N_AGE_ADULT - 1 {
        write_normalized(&mut mix, (SEX_FEMALE, b, SEX_MALE), oppo_raw.row(b).to_owned());
        write_normalized(&mut mix, (SEX_MALE, b, SEX_FEMALE), oppo_raw.column(b).to_owned());
        write_normalized(&mut mix, (SEX_MALE, b, SEX_MALE), same_raw.row(b).to_owned());
    }
    Ok(mix)
}

/// Unnormalized `(age, partner age)` weights: the probability mass of the
/// age difference falling in `[j − b, j − b + 1)`, excluding 80+ in both
/// dimensions.
fn difference_increments<F: Fn(f64) -> f64>(cdf: F) -> Array2<f64> {
    let mut raw = Array2::<f64>::zeros((N_AGE_ADULT, N_AGE_ADULT));
    for b in 0..N_AGE_ADULT - 1 {
        for j in 0..N_AGE_ADULT - 1 {
            let d = j as f64 - b as f64;
            raw[[b, j]] = cdf(d + 1.0) - cdf(d);
        }
    }
    raw
}

fn write_normalized(
    mix: &mut Array4<f64>, (sex, age, partner_sex): (usize, usize, usize),
    weights: Array1<f64>,
) {
    let total = weights.sum();
    if !(total > 0.0) || !total.is_finite() {
        warn!(sex, age, partner_sex, total, "age-mixing row has no mass; leaving it zero");
        return;
    }
    mix.slice_mut(s![sex, age, partner_sex, ..]).assign(&(weights / total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Every populated mixing row is a probability distribution.
    //
    // Given
    // -----
    // - Typical preferences: men 4 years older on average, variance 25;
    //   male-male variance 36.
    //
    // Expect
    // ------
    // - F→M, M→F and M→M rows for ages 15..79 sum to 1 within 1e-9.
    // - F→F rows and all 80+ rows are zero.
    fn mixing_rows_sum_to_one() {
        // Arrange
        let prefs = AgePreferences::new(4.0, 25.0, 36.0);

        // Act
        let mix = age_mixing(&prefs).unwrap();

        // Assert
        for b in 0..N_AGE_ADULT - 1 {
            for &(s1, s2) in &[(SEX_FEMALE, SEX_MALE), (SEX_MALE, SEX_FEMALE), (SEX_MALE, SEX_MALE)] {
                let row = mix.slice(s![s1, b, s2, ..]);
                assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
                assert!(row.iter().all(|&p| p >= 0.0));
            }
            assert_eq!(mix.slice(s![SEX_FEMALE, b, SEX_FEMALE, ..]).sum(), 0.0);
        }
        let last = N_AGE_ADULT - 1;
        assert_eq!(mix.slice(s![.., last, .., ..]).sum(), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Opposite-sex preferences put male partners of young women older
    // than them.
    //
    // Expect
    // ------
    // - For a 20-year-old woman, the most likely male partner is older.
    fn women_prefer_older_men_for_positive_mean() {
        let mix = age_mixing(&AgePreferences::new(5.0, 20.0, 30.0)).unwrap();
        let row = mix.slice(s![SEX_FEMALE, 5, SEX_MALE, ..]);
        let (argmax, _) = row
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (j, &p)| if p > acc.1 { (j, p) } else { acc });
        assert!(argmax > 5);
    }

    #[test]
    // Purpose
    // -------
    // Male-male mixing is symmetric around the same age.
    fn same_sex_mixing_is_centered() {
        let mix = age_mixing(&AgePreferences::new(4.0, 25.0, 16.0)).unwrap();
        let b: usize = 30;
        let row = mix.slice(s![SEX_MALE, b, SEX_MALE, ..]);
        assert_relative_eq!(row[b + 3], row[b - 4], epsilon = 1e-12);
    }

    #[test]
    fn invalid_preferences_are_rejected() {
        assert!(matches!(
            age_mixing(&AgePreferences::new(-12.0, 25.0, 16.0)),
            Err(TransformError::InvalidAgePreference { .. })
        ));
        assert!(matches!(
            age_mixing(&AgePreferences::new(4.0, 25.0, 0.0)),
            Err(TransformError::InvalidAgePreference { .. })
        ));
    }
}
