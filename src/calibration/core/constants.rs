//! Model dimensions, category indices, and the projection year window.
//!
//! Indices are 0-based positions into engine tensors. Several constants share
//! a value on purpose (`POP_FSW`/`POP_CSW`, `SEX_MALE`/`SEX_MALE_U`): the
//! same slot means different things for each sex.
use crate::transforms::errors::{TransformError, TransformResult};

// ---- Sex ----
pub const SEX_FEMALE: usize = 0;
pub const SEX_MALE: usize = 1;
/// Uncircumcised males in tensors that split males by circumcision status.
pub const SEX_MALE_U: usize = 1;
/// Circumcised males.
pub const SEX_MALE_C: usize = 2;
pub const N_SEX: usize = 2;
pub const N_SEX_MC: usize = 3;

// ---- Age ----
pub const AGE_ADULT_MIN: usize = 15;
pub const AGE_ADULT_MAX: usize = 80;
pub const N_AGE: usize = 81;
pub const N_AGE_ADULT: usize = AGE_ADULT_MAX - AGE_ADULT_MIN + 1;
pub const AGE_BIRTH_MAX: usize = 49;
pub const N_AGE_BIRTH: usize = AGE_BIRTH_MAX - AGE_ADULT_MIN + 1;

// ---- Behavioral risk populations ----
/// Never had sex.
pub const POP_NOSEX: usize = 0;
/// Never married.
pub const POP_NEVER: usize = 1;
/// Married or in a stable union.
pub const POP_UNION: usize = 2;
/// Previously married.
pub const POP_SPLIT: usize = 3;
/// People who inject drugs.
pub const POP_PWID: usize = 4;
/// Female sex workers (female slot).
pub const POP_FSW: usize = 5;
/// Clients of female sex workers (male slot).
pub const POP_CSW: usize = 5;
/// Men who have sex with men.
pub const POP_MSM: usize = 6;
/// Transgender women, modeled in the male (assigned sex at birth) block.
pub const POP_TGW: usize = 7;
pub const N_POP: usize = 8;

/// Rows in raw population tables, which omit `POP_NOSEX`.
pub const N_POP_RAW: usize = N_POP - 1;

// ---- HIV states ----
pub const N_HIV_ADULT: usize = 7;
pub const N_DTX: usize = 6;

// ---- Mother-to-child transmission ----
pub const MTCT_PN: usize = 0;
pub const MTCT_BF: usize = 1;
pub const N_MTCT: usize = 2;

pub const MTCT_RX_SDNVP: usize = 0;
pub const MTCT_RX_DUAL: usize = 1;
pub const MTCT_RX_OPT_A: usize = 2;
pub const MTCT_RX_OPT_B: usize = 3;
pub const MTCT_RX_ART_BEFORE: usize = 4;
pub const MTCT_RX_ART_DURING: usize = 5;
pub const MTCT_RX_ART_LATE: usize = 6;
pub const MTCT_RX_NONE: usize = 7;
pub const MTCT_RX_STOP: usize = 8;
pub const MTCT_RX_INCI: usize = 9;
pub const N_MTCT_RX: usize = 10;

pub const MTCT_CD4_000_200: usize = 0;
pub const MTCT_CD4_200_350: usize = 1;
pub const MTCT_CD4_GEQ_350: usize = 2;
pub const N_MTCT_CD4: usize = 3;

/// Calendar year stored at index 0 of every year-indexed input table.
pub const INPUT_FIRST_YEAR: i32 = 1970;

/// Inclusive range of calendar years covered by a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YearWindow {
    pub first: i32,
    pub last: i32,
}

impl YearWindow {
    /// Validated window; inputs start at [`INPUT_FIRST_YEAR`].
    pub fn new(first: i32, last: i32) -> TransformResult<Self> {
        if first < INPUT_FIRST_YEAR || last < first {
            return Err(TransformError::InvalidYearWindow { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn num_years(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    /// Row range of this window inside an input table that starts at
    /// [`INPUT_FIRST_YEAR`]. Fails if the table is too short.
    pub fn input_rows(&self, available: usize) -> TransformResult<std::ops::Range<usize>> {
        let start = (self.first - INPUT_FIRST_YEAR) as usize;
        let end = start + self.num_years();
        if end > available {
            return Err(TransformError::InputYearsTooShort { needed: end, available });
        }
        Ok(start..end)
    }

    /// Projection index of a calendar year, if it lies in the window.
    pub fn index_of(&self, year: i32) -> Option<usize> {
        (self.first..=self.last).contains(&year).then(|| (year - self.first) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_are_consistent() {
        assert_eq!(N_AGE_ADULT, 66);
        assert_eq!(N_AGE_BIRTH, 35);
        assert_eq!(N_POP_RAW, 7);
    }

    #[test]
    // Purpose
    // -------
    // Year windows locate their rows inside 1970-based input tables.
    fn year_window_maps_into_input_rows() {
        let w = YearWindow::new(1975, 1980).unwrap();
        assert_eq!(w.num_years(), 6);
        assert_eq!(w.input_rows(81).unwrap(), 5..11);
        assert_eq!(w.index_of(1977), Some(2));
        assert_eq!(w.index_of(1981), None);
        assert!(matches!(w.input_rows(10), Err(TransformError::InputYearsTooShort { .. })));
        assert!(YearWindow::new(1969, 2000).is_err());
        assert!(YearWindow::new(2000, 1999).is_err());
    }
}
