//! MAP calibration of a projection engine against ANC and survey data.
//!
//! A [`Calibrator`] owns the projection engine, the model-state snapshot
//! and the two data likelihoods. It evaluates
//!
//! ```text
//! log posterior(x) = Σ log prior_i(x_i) + ℓ_ANC(x) + ℓ_survey(x)
//! ```
//!
//! by writing `x` into the state, pushing stale inputs to the engine,
//! projecting through the last year of the window, and handing the model's
//! prevalence estimates to the likelihoods. [`Calibrator::calibrate`]
//! maximizes this posterior inside the priors' supports.
//!
//! ## Evaluation model
//! - Cost evaluations take `&self`; the engine, state and ANC evaluator sit
//!   behind `RefCell`s. The calibrator is therefore `!Sync`, and evaluation
//!   is single-threaded.
//! - Every evaluation invalidates the engine from the first year, so
//!   identical vectors give identical posteriors regardless of history.
//! - `last_valid_year` mirrors how far the engine's cached projection is
//!   known to be current.
use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;

use ndarray::{Array2, Array3};
use tracing::{debug, info};

use crate::calibration::core::engine::{EngineConfig, Invalidation, ProjectionEngine};
use crate::calibration::core::mapper::ParameterMapper;
use crate::calibration::core::observations::{
    anc_prevalence, check_outputs, survey_prevalence, validate_template, AncLikelihood,
    SurveyLikelihood,
};
use crate::calibration::core::params::ParameterSet;
use crate::calibration::core::state::{ModelInputs, ModelState};
use crate::calibration::errors::{CalibError, CalibResult};
use crate::calibration::models::sensitivity;
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::{
    maximize, LogDensity, OptimOptions, OptimOutcome, Theta,
};
use crate::transforms::AgePreferences;

/// Result of [`Calibrator::calibrate`].
///
/// - `parameters`: the parameter set with `fitted_value` filled in.
/// - `fitted`: name → MAP estimate.
/// - `outcome`: optimizer diagnostics; `outcome.value` is the best log
///   posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    pub parameters: ParameterSet,
    pub fitted: BTreeMap<String, f64>,
    pub outcome: OptimOutcome,
}

/// Posterior evaluator and optimizer driver.
#[derive(Debug)]
pub struct Calibrator<E, A, S> {
    params: ParameterSet,
    mapper: ParameterMapper,
    state: RefCell<ModelState>,
    engine: RefCell<E>,
    anc: RefCell<A>,
    survey: S,
    last_valid_year: Cell<Option<i32>>,
}

impl<E, A, S> Calibrator<E, A, S>
where
    E: ProjectionEngine,
    A: AncLikelihood,
    S: SurveyLikelihood,
{
    /// Initialize `engine`, build the model state and push every input.
    ///
    /// # Errors
    /// - [`CalibError::WindowMismatch`] if `config` and `inputs` disagree on
    ///   the projection window.
    /// - [`CalibError::InvalidSurveyRow`] for survey rows outside the window.
    /// - Any error from state construction or the engine.
    pub fn new(
        mut engine: E, inputs: ModelInputs, params: ParameterSet, mut anc: A, survey: S,
        config: &EngineConfig,
    ) -> CalibResult<Self> {
        let years = inputs.years;
        if config.years != years {
            return Err(CalibError::WindowMismatch {
                engine_first: config.years.first,
                engine_last: config.years.last,
                input_first: years.first,
                input_last: years.last,
            });
        }
        validate_template(survey.template(), years)?;

        engine.initialize(config)?;
        let state = ModelState::from_inputs(inputs)?;
        state.share_all(&mut engine)?;
        anc.set_parameters(&state.inputs().anc);
        engine.invalidate(Invalidation::FromStart);

        let mapper = ParameterMapper::new(&params);
        Ok(Self {
            params,
            mapper,
            state: RefCell::new(state),
            engine: RefCell::new(engine),
            anc: RefCell::new(anc),
            survey,
            last_valid_year: Cell::new(None),
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn state(&self) -> Ref<'_, ModelState> {
        self.state.borrow()
    }

    pub fn engine(&self) -> Ref<'_, E> {
        self.engine.borrow()
    }

    pub fn into_engine(self) -> E {
        self.engine.into_inner()
    }

    /// Last calendar year whose projection is current, if any.
    pub fn last_valid_year(&self) -> Option<i32> {
        self.last_valid_year.get()
    }

    /// Forward an invalidation to the engine and lower `last_valid_year`.
    pub fn invalidate(&self, from: Invalidation) {
        self.engine.borrow_mut().invalidate(from);
        let lowered = match from {
            Invalidation::FromStart => None,
            Invalidation::FromYear(year) => {
                let first = self.state().years().first;
                self.last_valid_year.get().map(|last| last.min(year - 1)).filter(|&y| y >= first)
            }
        };
        self.last_valid_year.set(lowered);
    }

    /// Project through `year`.
    pub fn project(&self, year: i32) -> CalibResult<()> {
        self.engine.borrow_mut().project(year)?;
        self.last_valid_year.set(Some(year));
        Ok(())
    }

    /// Log prior of `x`.
    pub fn prior(&self, x: &Theta) -> CalibResult<f64> {
        self.params.log_prior(x)
    }

    /// Log likelihood of `x`: ANC plus survey.
    ///
    /// # Errors
    /// - [`CalibError::VectorLengthMismatch`] for a wrongly sized `x`.
    /// - [`CalibError::DegenerateEstimate`] if an estimate has a zero
    ///   denominator.
    /// - Any error from transforms, the engine or the evaluators.
    pub fn likelihood(&self, x: &Theta) -> CalibResult<f64> {
        let years = self.state().years();
        {
            let mut state = self.state.borrow_mut();
            self.mapper.apply(x.view(), &mut state)?;
            let mut engine = self.engine.borrow_mut();
            let mut anc = self.anc.borrow_mut();
            self.mapper.refresh(&mut state, &mut *engine, &mut *anc)?;
        }
        self.last_valid_year.set(None);
        self.project(years.last)?;

        let engine = self.engine.borrow();
        let outputs = engine.outputs();
        check_outputs(&outputs, years)?;
        let anc_est = anc_prevalence(&outputs)?;
        let survey_est = survey_prevalence(&outputs, self.survey.template(), years)?;

        let lhood_anc = self.anc.borrow().likelihood(anc_est.view())?;
        let lhood_survey = self.survey.likelihood(survey_est.view())?;
        debug!(lhood_survey, lhood_anc, x = ?x.as_slice(), "likelihood evaluated");
        Ok(lhood_anc + lhood_survey)
    }

    /// Log posterior of `x`.
    pub fn posterior(&self, x: &Theta) -> CalibResult<f64> {
        Ok(self.prior(x)? + self.likelihood(x)?)
    }

    /// Maximize the log posterior from the registered initial values.
    ///
    /// ## Steps
    /// 1. Bounds from the padded prior supports; start from initial values.
    /// 2. Run the configured bounded optimizer on `-log posterior`.
    /// 3. Store the solution as each parameter's fitted value.
    /// 4. Re-evaluate at the solution so the engine holds the MAP projection.
    ///
    /// # Errors
    /// - [`CalibError::Optimization`] for invalid options, bounds, or solver
    ///   failures (objective errors arrive as their message).
    pub fn calibrate(&mut self, opts: &OptimOptions) -> CalibResult<CalibrationReport> {
        let bounds = self.params.bounds()?;
        let x0 = self.params.to_vector();
        info!(
            parameters = self.params.len(),
            method = ?opts.method,
            "starting calibration"
        );

        let outcome = maximize(&*self, x0, &(), &bounds, opts)?;
        self.params.set_fitted(&outcome.theta_hat)?;
        self.posterior(&outcome.theta_hat)?;

        info!(
            log_posterior = outcome.value,
            converged = outcome.converged,
            iterations = outcome.iterations,
            evaluations = outcome.cost_count(),
            status = %outcome.status,
            "calibration finished"
        );
        let fitted = self.params.from_vector(&outcome.theta_hat)?;
        Ok(CalibrationReport { parameters: self.params.clone(), fitted, outcome })
    }

    /// See [`sensitivity::sweep_pop_assortativity`].
    pub fn sweep_pop_assortativity(&self, tables: &[Array2<f64>]) -> CalibResult<Vec<Array3<f64>>> {
        let out = sensitivity::sweep_pop_assortativity(
            &mut self.state.borrow_mut(),
            &mut *self.engine.borrow_mut(),
            tables,
        );
        self.last_valid_year.set(None);
        out
    }

    /// See [`sensitivity::sweep_age_preferences`].
    pub fn sweep_age_preferences(&self, prefs: &[AgePreferences]) -> CalibResult<Vec<Array3<f64>>> {
        let out = sensitivity::sweep_age_preferences(
            &mut self.state.borrow_mut(),
            &mut *self.engine.borrow_mut(),
            prefs,
        );
        self.last_valid_year.set(None);
        out
    }

    /// See [`sensitivity::sweep_pop_ratios`].
    pub fn sweep_pop_ratios(&self, tables: &[Array2<f64>]) -> CalibResult<Vec<Array3<f64>>> {
        let out = sensitivity::sweep_pop_ratios(
            &mut self.state.borrow_mut(),
            &mut *self.engine.borrow_mut(),
            tables,
        );
        self.last_valid_year.set(None);
        out
    }
}

impl<E, A, S> LogDensity for Calibrator<E, A, S>
where
    E: ProjectionEngine,
    A: AncLikelihood,
    S: SurveyLikelihood,
{
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        Ok(self.posterior(theta)?)
    }

    /// Reject vectors of the wrong length or outside the priors' supports.
    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        self.params.from_vector(theta)?;
        for (p, &v) in self.params.iter().zip(theta.iter()) {
            if !p.prior.in_support(v) {
                let (lower, upper) = p.support();
                return Err(CalibError::InfeasibleInitial {
                    name: p.name().to_string(),
                    value: v,
                    lower,
                    upper,
                }
                .into());
            }
        }
        Ok(())
    }
}
