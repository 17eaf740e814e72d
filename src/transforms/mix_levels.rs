//! Mixing levels: which pairs of risk groups form partnerships, and of which
//! partnership type.
use ndarray::{s, Array2, Array4, ArrayBase, ArrayView2, DataMut, Ix2};

use crate::calibration::core::constants::{N_POP, N_SEX, POP_TGW, SEX_MALE};
use crate::transforms::errors::{TransformError, TransformResult};

/// Side of the raw table: six risk groups per sex, never-had-sex omitted.
pub const N_MIX_RAW: usize = 12;

const RAW_PER_SEX: usize = N_MIX_RAW / N_SEX;
const N_MIX: usize = N_SEX * N_POP;

/// Expand the raw `12 × 12` level table into `(sex, pop, sex, pop)`.
///
/// The raw table lists female groups (rows/cols 0..6) then male groups
/// (6..12), with TGW as the last female group. The expansion zero-pads the
/// never-had-sex slot of each sex and swaps TGW from the female block
/// (index 6 of the flat 16-wide layout) into the male block (index 15).
pub fn mixing_levels(raw: ArrayView2<i32>) -> TransformResult<Array4<i32>> {
    if raw.shape() != [N_MIX_RAW, N_MIX_RAW] {
        return Err(TransformError::ShapeMismatch {
            input: "mixing levels",
            expected: vec![N_MIX_RAW, N_MIX_RAW],
            found: raw.shape().to_vec(),
        });
    }
    let female = 1..1 + RAW_PER_SEX;
    let male = N_POP + 1..N_POP + 1 + RAW_PER_SEX;
    let raw_f = 0..RAW_PER_SEX;
    let raw_m = RAW_PER_SEX..N_MIX_RAW;

    let mut mix = Array2::<i32>::zeros((N_MIX, N_MIX));
    for (rows, raw_rows) in [(female.clone(), raw_f.clone()), (male.clone(), raw_m.clone())] {
        for (cols, raw_cols) in [(female.clone(), raw_f.clone()), (male.clone(), raw_m.clone())] {
            mix.slice_mut(s![rows.clone(), cols])
                .assign(&raw.slice(s![raw_rows.clone(), raw_cols]));
        }
    }

    let tgw_as_female = POP_TGW - 1;
    let tgw_as_male = SEX_MALE * N_POP + POP_TGW;
    swap_rows(&mut mix, tgw_as_female, tgw_as_male);
    swap_rows(&mut mix.view_mut().reversed_axes(), tgw_as_female, tgw_as_male);

    mix.into_shape((N_SEX, N_POP, N_SEX, N_POP)).map_err(|_| TransformError::ShapeMismatch {
        input: "mixing levels",
        expected: vec![N_SEX, N_POP, N_SEX, N_POP],
        found: vec![N_MIX, N_MIX],
    })
}

fn swap_rows<S>(mat: &mut ArrayBase<S, Ix2>, i: usize, j: usize)
where
    S: DataMut<Elem = i32>,
{
    for c in 0..mat.ncols() {
        mat.swap([i, c], [j, c]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::core::constants::{POP_FSW, POP_MSM, POP_NOSEX, SEX_FEMALE};

    #[test]
    // Purpose
    // -------
    // The raw table expands into engine layout with TGW relocated.
    //
    // Given
    // -----
    // - A raw table filled with 2.
    //
    // Expect
    // ------
    // - Never-had-sex rows and columns are 0 for both sexes.
    // - The female TGW slot is empty; the male TGW slot is populated.
    // - Regular groups keep level 2.
    fn expansion_pads_and_relocates_tgw() {
        // Arrange
        let raw = Array2::<i32>::from_elem((N_MIX_RAW, N_MIX_RAW), 2);

        // Act
        let mix = mixing_levels(raw.view()).unwrap();

        // Assert
        assert_eq!(mix.shape(), &[N_SEX, N_POP, N_SEX, N_POP]);
        for sex in 0..N_SEX {
            assert!(mix.slice(s![sex, POP_NOSEX, .., ..]).iter().all(|&v| v == 0));
            assert!(mix.slice(s![.., .., sex, POP_NOSEX]).iter().all(|&v| v == 0));
        }
        assert!(mix.slice(s![SEX_FEMALE, POP_TGW, .., ..]).iter().all(|&v| v == 0));
        assert!(mix.slice(s![.., .., SEX_FEMALE, POP_TGW]).iter().all(|&v| v == 0));
        assert_eq!(mix[[SEX_MALE, POP_TGW, SEX_MALE, POP_MSM]], 2);
        assert_eq!(mix[[SEX_MALE, POP_TGW, SEX_MALE, POP_TGW]], 2);
        assert_eq!(mix[[SEX_FEMALE, POP_FSW, SEX_MALE, POP_FSW]], 2);
    }

    #[test]
    // Purpose
    // -------
    // Individual cells land where the raw labelling says they should.
    //
    // Given
    // -----
    // - raw[i, j] = 100·i + j.
    //
    // Expect
    // ------
    // - Female FSW (raw 4) × male MSM (raw 11) lands at (F, 5, M, 6).
    // - TGW (raw 5) × male CSW (raw 10) lands at (M, 7, M, 5).
    fn cells_follow_the_raw_labelling() {
        let raw = Array2::from_shape_fn((N_MIX_RAW, N_MIX_RAW), |(i, j)| (100 * i + j) as i32);

        let mix = mixing_levels(raw.view()).unwrap();

        assert_eq!(mix[[SEX_FEMALE, POP_FSW, SEX_MALE, POP_MSM]], 411);
        assert_eq!(mix[[SEX_MALE, POP_TGW, SEX_MALE, POP_FSW]], 510);
        assert_eq!(mix[[SEX_MALE, POP_MSM, SEX_MALE, POP_TGW]], 1105);
    }

    #[test]
    fn misshapen_table_is_rejected() {
        let raw = Array2::<i32>::zeros((N_POP, N_POP));
        assert!(mixing_levels(raw.view()).is_err());
    }
}
