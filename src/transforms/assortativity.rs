//! Population assortativity: the share of partnerships each risk group forms
//! within its own group.
use ndarray::{s, Array2, ArrayView2};

use crate::calibration::core::constants::{
    N_POP, N_POP_RAW, N_SEX, POP_FSW, POP_MSM, POP_NEVER, POP_TGW, SEX_FEMALE, SEX_MALE,
};
use crate::transforms::errors::{TransformError, TransformResult};

/// Convert raw assortativity percentages `(7, sex)` into proportions laid
/// out `(sex, pop)`.
///
/// The never-had-sex column is zero and the TGW value is read from the
/// female (gender identity) column and stored under males.
pub fn pop_assortativity(prefs: ArrayView2<f64>) -> TransformResult<Array2<f64>> {
    if prefs.shape() != [N_POP_RAW, N_SEX] {
        return Err(TransformError::ShapeMismatch {
            input: "population assortativity",
            expected: vec![N_POP_RAW, N_SEX],
            found: prefs.shape().to_vec(),
        });
    }
    let mut assort = Array2::<f64>::zeros((N_SEX, N_POP));
    assort
        .slice_mut(s![SEX_FEMALE, POP_NEVER..=POP_FSW])
        .assign(&(&prefs.slice(s![0..POP_FSW, SEX_FEMALE]) * 0.01));
    assort
        .slice_mut(s![SEX_MALE, POP_NEVER..=POP_MSM])
        .assign(&(&prefs.slice(s![0..POP_MSM, SEX_MALE]) * 0.01));
    assort[[SEX_MALE, POP_TGW]] = 0.01 * prefs[[POP_TGW - 1, SEX_FEMALE]];
    Ok(assort)
}
