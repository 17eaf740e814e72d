//! Mother-to-child transmission rates by timing, prophylaxis regimen, and
//! maternal CD4 band.
use std::collections::BTreeMap;

use ndarray::{s, Array3};

use crate::calibration::core::constants::{
    MTCT_BF, MTCT_CD4_000_200, MTCT_CD4_200_350, MTCT_CD4_GEQ_350, MTCT_PN, MTCT_RX_ART_BEFORE,
    MTCT_RX_ART_DURING, MTCT_RX_ART_LATE, MTCT_RX_DUAL, MTCT_RX_INCI, MTCT_RX_NONE, MTCT_RX_OPT_A,
    MTCT_RX_OPT_B, MTCT_RX_SDNVP, MTCT_RX_STOP, N_MTCT, N_MTCT_CD4, N_MTCT_RX,
};
use crate::transforms::errors::{TransformError, TransformResult};

/// Named MTCT percentages, keyed as in the input workbook
/// (`"peri.sdnvp"`, `"bf.none.lt.200"`, ...).
pub type MtctInputs = BTreeMap<String, f64>;

/// Regimens whose rate does not depend on maternal CD4, for both timings.
const FLAT_REGIMENS: [(usize, &str); 5] = [
    (MTCT_RX_OPT_A, "opt.a"),
    (MTCT_RX_OPT_B, "opt.b"),
    (MTCT_RX_ART_BEFORE, "art.before"),
    (MTCT_RX_ART_DURING, "art.during"),
    (MTCT_RX_ART_LATE, "art.late"),
];

/// Untreated rates per CD4 band; stopped prophylaxis reuses them.
const NONE_BANDS: [(usize, &str); 3] = [
    (MTCT_CD4_000_200, "none.lt.200"),
    (MTCT_CD4_200_350, "none.200.350"),
    (MTCT_CD4_GEQ_350, "none.gt.350"),
];

/// Build the `(timing, regimen, CD4)` rate tensor from named percentages.
///
/// - Perinatal single-dose nevirapine and dual ARV rates apply to every CD4
///   band; during breastfeeding they are split into `lt.350` (bands 0 and 1)
///   and `gt.350` (band 2).
/// - "Stopped prophylaxis" uses the "no prophylaxis" rate of each band.
/// - Percentages are converted to proportions.
///
/// # Errors
/// [`TransformError::MissingMtctRate`] if any expected name is absent.
pub fn mtct_rates(inputs: &MtctInputs) -> TransformResult<Array3<f64>> {
    let mut rates = Array3::<f64>::zeros((N_MTCT, N_MTCT_RX, N_MTCT_CD4));

    for (timing, prefix) in [(MTCT_PN, "peri"), (MTCT_BF, "bf")] {
        for (rx, name) in FLAT_REGIMENS.iter().copied().chain([(MTCT_RX_INCI, "inci")]) {
            let v = lookup(inputs, prefix, name)?;
            rates.slice_mut(s![timing, rx, ..]).fill(v);
        }
        for (cd4, name) in NONE_BANDS {
            let v = lookup(inputs, prefix, name)?;
            rates[[timing, MTCT_RX_NONE, cd4]] = v;
            rates[[timing, MTCT_RX_STOP, cd4]] = v;
        }
    }

    for (rx, name) in [(MTCT_RX_SDNVP, "sdnvp"), (MTCT_RX_DUAL, "dual")] {
        let v = lookup(inputs, "peri", name)?;
        rates.slice_mut(s![MTCT_PN, rx, ..]).fill(v);

        let low = lookup(inputs, "bf", &format!("{name}.lt.350"))?;
        let high = lookup(inputs, "bf", &format!("{name}.gt.350"))?;
        rates[[MTCT_BF, rx, MTCT_CD4_000_200]] = low;
        rates[[MTCT_BF, rx, MTCT_CD4_200_350]] = low;
        rates[[MTCT_BF, rx, MTCT_CD4_GEQ_350]] = high;
    }

    rates.mapv_inplace(|v| 0.01 * v);
    Ok(rates)
}

/// Every input name [`mtct_rates`] reads.
pub fn mtct_input_names() -> Vec<String> {
    let mut names = Vec::new();
    for prefix in ["peri", "bf"] {
        for (_, name) in FLAT_REGIMENS.iter().chain(NONE_BANDS.iter()) {
            names.push(format!("{prefix}.{name}"));
        }
        names.push(format!("{prefix}.inci"));
    }
    for name in ["sdnvp", "dual"] {
        names.push(format!("peri.{name}"));
        names.push(format!("bf.{name}.lt.350"));
        names.push(format!("bf.{name}.gt.350"));
    }
    names
}

fn lookup(inputs: &MtctInputs, prefix: &str, name: &str) -> TransformResult<f64> {
    let key = format!("{prefix}.{name}");
    inputs.get(&key).copied().ok_or_else(|| TransformError::MissingMtctRate { name: key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full_inputs() -> MtctInputs {
        mtct_input_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, 10.0 + i as f64))
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Stopped prophylaxis aliases the untreated rates and values are scaled
    // from percent.
    //
    // Given
    // -----
    // - Distinct percentages for every input name; peri.none.* = 20/30/40.
    //
    // Expect
    // ------
    // - NONE and STOP rows equal (0.2, 0.3, 0.4) perinatally.
    // - Flat regimens broadcast across the CD4 bands.
    fn stop_aliases_none_and_percent_is_scaled() {
        // Arrange
        let mut inputs = full_inputs();
        inputs.insert("peri.none.lt.200".into(), 20.0);
        inputs.insert("peri.none.200.350".into(), 30.0);
        inputs.insert("peri.none.gt.350".into(), 40.0);
        inputs.insert("bf.art.during".into(), 2.5);

        // Act
        let rates = mtct_rates(&inputs).unwrap();

        // Assert
        assert_eq!(rates.shape(), &[N_MTCT, N_MTCT_RX, N_MTCT_CD4]);
        for (cd4, expected) in [0.2, 0.3, 0.4].into_iter().enumerate() {
            assert_relative_eq!(rates[[MTCT_PN, MTCT_RX_NONE, cd4]], expected, epsilon = 1e-15);
            assert_eq!(rates[[MTCT_PN, MTCT_RX_STOP, cd4]], rates[[MTCT_PN, MTCT_RX_NONE, cd4]]);
            assert_eq!(rates[[MTCT_BF, MTCT_RX_STOP, cd4]], rates[[MTCT_BF, MTCT_RX_NONE, cd4]]);
            assert_relative_eq!(rates[[MTCT_BF, MTCT_RX_ART_DURING, cd4]], 0.025, epsilon = 1e-15);
        }
    }

    #[test]
    // Purpose
    // -------
    // Breastfeeding sdNVP and dual rates split at CD4 350.
    fn breastfeeding_prophylaxis_splits_at_350() {
        let mut inputs = full_inputs();
        inputs.insert("bf.sdnvp.lt.350".into(), 7.0);
        inputs.insert("bf.sdnvp.gt.350".into(), 3.0);
        inputs.insert("peri.dual".into(), 5.0);

        let rates = mtct_rates(&inputs).unwrap();

        assert_relative_eq!(rates[[MTCT_BF, MTCT_RX_SDNVP, MTCT_CD4_000_200]], 0.07);
        assert_relative_eq!(rates[[MTCT_BF, MTCT_RX_SDNVP, MTCT_CD4_200_350]], 0.07);
        assert_relative_eq!(rates[[MTCT_BF, MTCT_RX_SDNVP, MTCT_CD4_GEQ_350]], 0.03);
        assert!(rates.slice(s![MTCT_PN, MTCT_RX_DUAL, ..]).iter().all(|&v| (v - 0.05).abs() < 1e-15));
    }

    #[test]
    fn missing_rate_is_reported_by_name() {
        let mut inputs = full_inputs();
        inputs.remove("bf.inci");
        assert_eq!(
            mtct_rates(&inputs),
            Err(TransformError::MissingMtctRate { name: "bf.inci".to_string() })
        );
    }

    #[test]
    fn input_catalogue_has_no_duplicates() {
        let names = mtct_input_names();
        let unique: std::collections::BTreeSet<_> = names.iter().collect();
        assert_eq!(names.len(), 24);
        assert_eq!(unique.len(), names.len());
    }
}
