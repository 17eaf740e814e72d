//! Parameter-vector → model-state dispatch.
//!
//! A [`ParameterMapper`] holds the fit keys in canonical order. `apply`
//! writes one vector into a [`ModelState`]; `refresh` brings the engine and
//! the ANC evaluator in line with the state and invalidates every projected
//! year.
use ndarray::ArrayView1;

use crate::calibration::core::engine::ProjectionEngine;
use crate::calibration::core::keys::FitKey;
use crate::calibration::core::observations::AncLikelihood;
use crate::calibration::core::params::ParameterSet;
use crate::calibration::core::state::ModelState;
use crate::calibration::errors::{CalibError, CalibResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapper {
    keys: Vec<FitKey>,
}

impl ParameterMapper {
    pub fn new(params: &ParameterSet) -> Self {
        Self { keys: params.keys() }
    }

    pub fn keys(&self) -> &[FitKey] {
        &self.keys
    }

    /// Run every setter for `x`, marking the affected inputs dirty.
    ///
    /// # Errors
    /// [`CalibError::VectorLengthMismatch`] if `x` has the wrong length.
    pub fn apply(&self, x: ArrayView1<f64>, state: &mut ModelState) -> CalibResult<()> {
        if x.len() != self.keys.len() {
            return Err(CalibError::VectorLengthMismatch { expected: self.keys.len(), found: x.len() });
        }
        for (&key, &v) in self.keys.iter().zip(x.iter()) {
            state.apply(key, v);
        }
        Ok(())
    }

    /// Recompute dirty tensors, push them (ANC nuisance parameters go to
    /// `anc`), invalidate from the start, and commit the state.
    ///
    /// Invalidation happens even when nothing was dirty so the next
    /// projection always starts from the first year.
    pub fn refresh<E, A>(
        &self, state: &mut ModelState, engine: &mut E, anc: &mut A,
    ) -> CalibResult<()>
    where
        E: ProjectionEngine + ?Sized,
        A: AncLikelihood + ?Sized,
    {
        if state.flush(engine)? {
            anc.set_parameters(&state.inputs().anc);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::core::engine::{
        EngineConfig, Invalidation, ProjectionOutputs, TransmissionParams,
    };
    use crate::calibration::core::observations::AncLikelihoodParams;
    use crate::calibration::core::params::ParameterRegistry;
    use crate::calibration::core::priors::PriorKind;
    use crate::calibration::core::state::tests::sample_inputs;
    use ndarray::{array, ArrayView2, ArrayView3, ArrayView4};

    /// Records the calls a refresh makes.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        transmission: Option<TransmissionParams>,
        invalidations: Vec<Invalidation>,
    }

    impl ProjectionEngine for Recorder {
        fn initialize(&mut self, _: &EngineConfig) -> CalibResult<()> {
            Ok(())
        }
        fn share_partner_rate(&mut self, _: ArrayView4<f64>) -> CalibResult<()> {
            self.calls.push("partner_rate");
            Ok(())
        }
        fn share_age_mixing(&mut self, _: ArrayView4<f64>) -> CalibResult<()> {
            self.calls.push("age_mixing");
            Ok(())
        }
        fn share_pop_assort(&mut self, _: ArrayView2<f64>) -> CalibResult<()> {
            self.calls.push("pop_assort");
            Ok(())
        }
        fn share_pwid_risk(&mut self, _: ArrayView2<f64>, _: ArrayView1<f64>) -> CalibResult<()> {
            self.calls.push("pwid");
            Ok(())
        }
        fn init_mixing_matrix(&mut self, _: ArrayView4<i32>) -> CalibResult<()> {
            Ok(())
        }
        fn init_sti_prev(&mut self, _: ArrayView4<f64>) -> CalibResult<()> {
            Ok(())
        }
        fn init_mtct_rates(&mut self, _: ArrayView3<f64>) -> CalibResult<()> {
            Ok(())
        }
        fn init_transmission(&mut self, params: &TransmissionParams) -> CalibResult<()> {
            self.calls.push("transmission");
            self.transmission = Some(*params);
            Ok(())
        }
        fn init_hiv_fertility(
            &mut self, _: ArrayView2<f64>, _: ArrayView1<f64>, _: ArrayView1<f64>,
        ) -> CalibResult<()> {
            self.calls.push("fertility");
            Ok(())
        }
        fn init_epidemic_seed(&mut self, _: usize, _: f64) -> CalibResult<()> {
            self.calls.push("seed");
            Ok(())
        }
        fn project(&mut self, _: i32) -> CalibResult<()> {
            Ok(())
        }
        fn invalidate(&mut self, from: Invalidation) {
            self.invalidations.push(from);
        }
        fn outputs(&self) -> ProjectionOutputs<'_> {
            unreachable!("mapper tests never read outputs")
        }
    }

    #[derive(Default)]
    struct AncSink(Option<AncLikelihoodParams>);

    impl AncLikelihood for AncSink {
        fn set_parameters(&mut self, params: &AncLikelihoodParams) {
            self.0 = Some(*params);
        }
        fn likelihood(&self, _: ArrayView1<f64>) -> CalibResult<f64> {
            Ok(0.0)
        }
    }

    #[test]
    // Purpose
    // -------
    // Only dirty inputs are pushed, transmission goes as a full set, and the
    // engine is invalidated from the start.
    //
    // Given
    // -----
    // - Registry: ancss.bias, assort.fsw, transmit.f2m.
    //
    // Expect
    // ------
    // - Calls: transmission then pop_assort (derived-input order).
    // - The pushed transmission set carries the new f2m and the old m2f.
    // - ANC evaluator receives the bias; state version advances to 1.
    fn refresh_pushes_only_dirty_inputs() {
        // Arrange
        let mut reg = ParameterRegistry::new();
        reg.register("transmit.f2m", 0.001, PriorKind::Beta, 1.0, 100.0, true)
            .unwrap()
            .register("assort.fsw", 0.5, PriorKind::Beta, 2.0, 2.0, true)
            .unwrap()
            .register("ancss.bias", 0.0, PriorKind::Normal, 0.0, 1.0, true)
            .unwrap();
        let mapper = ParameterMapper::new(&reg.build());
        let mut state = ModelState::from_inputs(sample_inputs()).unwrap();
        let (mut engine, mut anc) = (Recorder::default(), AncSink::default());

        // Act
        mapper.apply(array![0.2, 0.6, 0.003].view(), &mut state).unwrap();
        mapper.refresh(&mut state, &mut engine, &mut anc).unwrap();

        // Assert
        assert_eq!(engine.calls, vec!["transmission", "pop_assort"]);
        let tr = engine.transmission.unwrap();
        assert_eq!(tr.f2m, 0.003);
        assert_eq!(tr.m2f, 0.002);
        assert_eq!(anc.0.unwrap().ancss_bias, 0.2);
        assert_eq!(engine.invalidations, vec![Invalidation::FromStart]);
        assert_eq!(state.version(), 1);
        assert!(state.dirty().is_empty());
    }

    #[test]
    fn wrong_length_vector_is_rejected() {
        let mut reg = ParameterRegistry::new();
        reg.register("seed.prev", 0.001, PriorKind::Beta, 1.0, 100.0, true).unwrap();
        let mapper = ParameterMapper::new(&reg.build());
        let mut state = ModelState::from_inputs(sample_inputs()).unwrap();
        assert!(matches!(
            mapper.apply(array![0.1, 0.2].view(), &mut state),
            Err(CalibError::VectorLengthMismatch { expected: 1, found: 2 })
        ));
    }
}
