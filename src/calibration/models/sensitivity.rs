//! Sensitivity sweeps over mixing inputs.
//!
//! Each sweep substitutes one alternative input at a time, re-projects the
//! whole window, and records new infections by `(year, sex, pop)` (summed
//! over age). The baseline input is restored and re-pushed afterwards, even
//! when an alternative fails, so the engine is left consistent with the
//! state.
use ndarray::{Array2, Array3, Axis};
use tracing::info;

use crate::calibration::core::constants::{N_POP, N_SEX_MC};
use crate::calibration::core::engine::{ProjectionEngine, ProjectionOutputs};
use crate::calibration::core::state::ModelState;
use crate::calibration::errors::{CalibError, CalibResult};
use crate::transforms::AgePreferences;

/// New infections `(year, sex, pop)` for each `(7, sex)` assortativity table
/// (percent).
pub fn sweep_pop_assortativity<E: ProjectionEngine + ?Sized>(
    state: &mut ModelState, engine: &mut E, tables: &[Array2<f64>],
) -> CalibResult<Vec<Array3<f64>>> {
    let baseline = state.inputs().pop_prefs.clone();
    sweep(state, engine, tables, baseline, ModelState::set_pop_prefs, "population assortativity")
}

/// New infections `(year, sex, pop)` for each set of partner age
/// preferences.
pub fn sweep_age_preferences<E: ProjectionEngine + ?Sized>(
    state: &mut ModelState, engine: &mut E, prefs: &[AgePreferences],
) -> CalibResult<Vec<Array3<f64>>> {
    let baseline = state.inputs().age_prefs;
    sweep(state, engine, prefs, baseline, ModelState::set_age_prefs, "age preferences")
}

/// New infections `(year, sex, pop)` for each `(7, sex)` table of
/// population partner-rate ratios.
pub fn sweep_pop_ratios<E: ProjectionEngine + ?Sized>(
    state: &mut ModelState, engine: &mut E, tables: &[Array2<f64>],
) -> CalibResult<Vec<Array3<f64>>> {
    let baseline = state.inputs().partner_pop_ratios.clone();
    sweep(state, engine, tables, baseline, ModelState::set_pop_ratios, "population rate ratios")
}

/// New infections summed over age, checked against the projection window.
pub fn new_infections_by_pop(
    outputs: &ProjectionOutputs<'_>, num_years: usize,
) -> CalibResult<Array3<f64>> {
    let shape = outputs.new_infections.shape();
    if shape[0] != num_years || shape[1] != N_SEX_MC || shape[3] != N_POP {
        return Err(CalibError::OutputShape {
            output: "new_infections",
            expected: vec![num_years, N_SEX_MC, shape[2], N_POP],
            found: shape.to_vec(),
        });
    }
    Ok(outputs.new_infections.sum_axis(Axis(2)))
}

fn sweep<E, T, F>(
    state: &mut ModelState, engine: &mut E, alternatives: &[T], baseline: T, set: F,
    what: &'static str,
) -> CalibResult<Vec<Array3<f64>>>
where
    E: ProjectionEngine + ?Sized,
    T: Clone,
    F: Fn(&mut ModelState, T),
{
    info!(what, alternatives = alternatives.len(), "starting sensitivity sweep");
    let result = run_alternatives(state, engine, alternatives, &set);
    set(state, baseline);
    state.flush(engine)?;
    result
}

fn run_alternatives<E, T, F>(
    state: &mut ModelState, engine: &mut E, alternatives: &[T], set: &F,
) -> CalibResult<Vec<Array3<f64>>>
where
    E: ProjectionEngine + ?Sized,
    T: Clone,
    F: Fn(&mut ModelState, T),
{
    let years = state.years();
    let mut out = Vec::with_capacity(alternatives.len());
    for alt in alternatives {
        set(state, alt.clone());
        state.flush(&mut *engine)?;
        engine.project(years.last)?;
        out.push(new_infections_by_pop(&engine.outputs(), years.num_years())?);
    }
    Ok(out)
}
