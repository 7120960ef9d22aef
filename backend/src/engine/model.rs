//! Epidemic model - the time-stepped simulation engine
//!
//! # Step loop
//!
//! ```text
//! For each step t in 1..T:
//! 1. Lockdown multiplier from the policy (default 1.0)
//! 2. Contact mix and force of infection α from the state at t-1
//! 3. Phase-dependent testing and quarantine rates
//! 4. Trace rates from the states at t-2 (contacts) and t-3 (index cases)
//! 5. Build the 12×12 transition matrix, fill the diagonal
//! 6. Validate (fatal on failure)
//! 7. Advance: state_t = Pᵀ · state_{t-1}
//! 8. Record tests, reported cases and productivity
//! ```
//!
//! The model holds only immutable parameters; every call to
//! [`EpidemicModel::simulate`] builds its own state, so a shared
//! `&EpidemicModel` can serve many threads at once.

use super::rates::{contact_mix, trace_rates, ActiveRates, Phase, TraceInputs, TraceRates};
use super::trajectory::{StepRecord, Trajectories, TrajectoryRecorder};
use super::SimulationError;
use crate::config::params::{DerivedRates, EpidemicParams};
use crate::config::scenario::{ExperimentStart, ScenarioParams};
use crate::core::time::TimeGrid;
use crate::models::{groups, Compartment, CompartmentVector, TransitionMatrix};
use crate::schedule::Policy;
use tracing::{debug, error};

/// Default lockdown multiplier: no lockdown
const NO_LOCKDOWN: f64 = 1.0;

/// Callback invoked after every simulated step
///
/// Implemented for any `FnMut(step, &matrix, &state)` closure.
pub trait StepObserver {
    fn on_step(&mut self, step: usize, matrix: &TransitionMatrix, state: &CompartmentVector);
}

impl<F> StepObserver for F
where
    F: FnMut(usize, &TransitionMatrix, &CompartmentVector),
{
    fn on_step(&mut self, step: usize, matrix: &TransitionMatrix, state: &CompartmentVector) {
        self(step, matrix, state)
    }
}

/// The epidemic model: fixed parameters plus the rates derived from them
#[derive(Debug, Clone)]
pub struct EpidemicModel {
    params: EpidemicParams,
    rates: DerivedRates,
    grid: TimeGrid,
}

impl EpidemicModel {
    /// Create a model from validated parameters
    ///
    /// # Example
    ///
    /// ```rust
    /// use epidemic_policy_core_rs::{EpidemicModel, EpidemicParams, Policy, ScenarioParams};
    ///
    /// let params = EpidemicParams { horizon_days: 30, ..Default::default() };
    /// let model = EpidemicModel::new(params).unwrap();
    /// let trajectories = model
    ///     .simulate(&ScenarioParams::baseline(), &Policy::no_intervention())
    ///     .unwrap();
    /// assert_eq!(trajectories.num_days(), 30);
    /// ```
    pub fn new(params: EpidemicParams) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            rates: params.derive(),
            grid: params.time_grid(),
            params,
        })
    }

    pub fn params(&self) -> &EpidemicParams {
        &self.params
    }

    pub fn rates(&self) -> &DerivedRates {
        &self.rates
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Run the full horizon for one policy
    pub fn simulate(
        &self,
        scenario: &ScenarioParams,
        policy: &Policy,
    ) -> Result<Trajectories, SimulationError> {
        self.simulate_observed(scenario, policy, &mut |_: usize,
                                                        _: &TransitionMatrix,
                                                        _: &CompartmentVector| {})
    }

    /// Run the full horizon, calling `observer` after every step
    pub fn simulate_observed<O: StepObserver>(
        &self,
        scenario: &ScenarioParams,
        policy: &Policy,
        observer: &mut O,
    ) -> Result<Trajectories, SimulationError> {
        scenario.validate()?;
        let experiment_start = self.resolve_experiment_start(scenario)?;
        self.run(scenario, policy, experiment_start, observer)
    }

    /// Concrete start step for `scenario`
    ///
    /// For [`ExperimentStart::AfterOutbreak`] this runs a no-intervention
    /// baseline. If the reported-case threshold is never crossed,
    /// interventions never start.
    pub fn resolve_experiment_start(&self, scenario: &ScenarioParams) -> Result<usize, SimulationError> {
        match scenario.experiment_start {
            ExperimentStart::Step(step) => Ok(step),
            ExperimentStart::AfterOutbreak {
                reported_threshold,
                offset_days,
            } => {
                let baseline = self.run(
                    &ScenarioParams::baseline(),
                    &Policy::no_intervention(),
                    usize::MAX,
                    &mut |_: usize, _: &TransitionMatrix, _: &CompartmentVector| {},
                )?;
                let start = match baseline.reported.iter().position(|r| *r > reported_threshold) {
                    Some(day) => self.grid.step_of_day(day + 1 + offset_days),
                    None => usize::MAX,
                };
                debug!(
                    reported_threshold,
                    offset_days,
                    experiment_start = start,
                    "Resolved experiment start from baseline outbreak"
                );
                Ok(start)
            }
        }
    }

    /// Copy of `scenario` with its start resolved to a fixed step, so
    /// repeated simulations skip the baseline run
    pub fn resolve_scenario(&self, scenario: &ScenarioParams) -> Result<ScenarioParams, SimulationError> {
        scenario.validate()?;
        Ok(scenario.with_start_step(self.resolve_experiment_start(scenario)?))
    }

    fn run<O: StepObserver>(
        &self,
        scenario: &ScenarioParams,
        policy: &Policy,
        experiment_start: usize,
        observer: &mut O,
    ) -> Result<Trajectories, SimulationError> {
        let spd = self.grid.steps_per_day();
        let population = self.params.population;
        let mut recorder = TrajectoryRecorder::new(
            self.grid,
            self.params.quarantine_productivity,
            self.params.test_cost,
        );

        let (asymptomatic_seed, symptomatic_seed) = self.params.seed_fractions();
        let mut state = CompartmentVector::seeded(asymptomatic_seed, symptomatic_seed);
        // Mass before time 0 is zero
        let mut lag2 = CompartmentVector::zeros();
        let mut lag3 = CompartmentVector::zeros();

        recorder.record(StepRecord {
            step: 0,
            lockdown: policy.lockdown.value_at_with(0, spd, NO_LOCKDOWN),
            state: &state,
            force_of_infection: 0.0,
            trace: TraceRates::default(),
            tests: 0.0,
            reported: 0.0,
        });

        for step in 1..self.grid.total_steps() {
            let lockdown = policy.lockdown.value_at_with(step, spd, NO_LOCKDOWN);
            let phase = Phase::at(step, experiment_start, self.params.vaccine_step);
            let scheduled_testing = policy.testing.value_at_with(step, spd, scenario.testing_rate);
            let active = ActiveRates::select(phase, scenario, scheduled_testing);

            let mix = contact_mix(&state, lockdown, &self.rates);
            let trace = trace_rates(
                &TraceInputs {
                    current: &state,
                    contacts: &lag2,
                    index_cases: &lag3,
                    lockdown,
                    contact_mass: mix.contact_mass,
                    efficiency: self.params.trace_efficiency,
                },
                &active,
                &self.rates,
            );

            let matrix = self.transition_matrix(lockdown, mix.force_of_infection, &active, &trace);
            if let Err(violation) = matrix.validate() {
                error!(
                    step,
                    row = violation.row,
                    col = violation.col,
                    value = violation.value,
                    "Transition matrix is not stochastic:\n{}",
                    matrix
                );
                return Err(SimulationError::InvalidTransitionMatrix {
                    step,
                    violation,
                    matrix: Box::new(matrix),
                });
            }

            let next = matrix.advance(&state);

            let tests = (state.mass(groups::TESTABLE) * active.testing
                + state.mass(groups::TRACE_TESTABLE) * active.trace_testing)
                * population;
            let reported = population * self.reported_flow(&next, &active);

            observer.on_step(step, &matrix, &next);
            recorder.record(StepRecord {
                step,
                lockdown,
                state: &next,
                force_of_infection: mix.force_of_infection,
                trace,
                tests,
                reported,
            });

            lag3 = lag2;
            lag2 = state;
            state = next;
        }

        Ok(recorder.finish())
    }

    /// Fraction newly reported this step: positive tests and symptom onset
    /// among unknown infected, plus negative results among unknown
    /// not-infected
    fn reported_flow(&self, state: &CompartmentVector, active: &ActiveRates) -> f64 {
        use Compartment::*;
        let delta = self.rates.symptom_onset;
        let tau = active.testing;
        let tau_tt = active.trace_testing;

        (active.sensitivity * tau + delta) * state[UnknownAsymptomatic]
            + (active.sensitivity * tau_tt + delta) * state[UnknownAsymptomaticQuarantined]
            + active.specificity * tau * state[UnknownNotInfected]
            + active.specificity * (tau + tau_tt) * state[UnknownNotInfectedQuarantined]
    }

    fn transition_matrix(
        &self,
        lockdown: f64,
        alpha: f64,
        active: &ActiveRates,
        trace: &TraceRates,
    ) -> TransitionMatrix {
        use Compartment::*;
        let r = &self.rates;
        let free_infection = lockdown * r.contact * alpha;
        let q_infection = r.contact_quarantined * alpha;
        let tau = active.testing;
        let tau_q = active.testing + active.trace_testing;
        let tau_tt = active.trace_testing;
        let sens = active.sensitivity;
        let spec = active.specificity;
        let exit_unknown = active.quarantine_exit.unknown;

        let mut m = TransitionMatrix::zeros();

        m.set(UnknownNotInfected, UnknownNotInfectedQuarantined, trace.not_infected);
        m.set(UnknownNotInfected, KnownNotInfected, tau * spec);
        m.set(UnknownNotInfected, UnknownAsymptomatic, free_infection);
        m.set(UnknownNotInfected, FalsePositiveQuarantined, tau * (1.0 - spec));

        m.set(UnknownNotInfectedQuarantined, UnknownNotInfected, exit_unknown);
        m.set(UnknownNotInfectedQuarantined, KnownNotInfected, tau_q * spec);
        m.set(UnknownNotInfectedQuarantined, UnknownAsymptomaticQuarantined, q_infection);
        m.set(UnknownNotInfectedQuarantined, FalsePositiveQuarantined, tau_q * (1.0 - spec));

        m.set(KnownNotInfected, UnknownNotInfected, self.params.knowledge_decay);
        m.set(KnownNotInfected, UnknownAsymptomatic, free_infection);

        m.set(UnknownAsymptomatic, UnknownAsymptomaticQuarantined, trace.infected);
        m.set(UnknownAsymptomatic, KnownAsymptomaticQuarantined, tau * sens);
        m.set(UnknownAsymptomatic, FalseNegative, tau * (1.0 - sens));
        m.set(UnknownAsymptomatic, KnownSymptomaticQuarantined, r.symptom_onset);
        m.set(UnknownAsymptomatic, Recovered, r.recovery);

        m.set(UnknownAsymptomaticQuarantined, UnknownAsymptomatic, exit_unknown);
        m.set(UnknownAsymptomaticQuarantined, KnownAsymptomaticQuarantined, tau_tt * sens);
        m.set(UnknownAsymptomaticQuarantined, FalseNegative, tau_tt * (1.0 - sens));
        m.set(UnknownAsymptomaticQuarantined, KnownSymptomaticQuarantined, r.symptom_onset);
        m.set(UnknownAsymptomaticQuarantined, RecoveredQuarantined, r.recovery);

        m.set(KnownAsymptomaticQuarantined, KnownSymptomaticQuarantined, r.symptom_onset);
        m.set(KnownAsymptomaticQuarantined, RecoveredQuarantined, r.recovery);

        // A false positive may still be infected while quarantined
        m.set(FalsePositiveQuarantined, UnknownNotInfected, r.recovery);
        m.set(FalsePositiveQuarantined, KnownAsymptomaticQuarantined, q_infection);

        m.set(FalseNegative, KnownSymptomaticQuarantined, r.symptom_onset);
        m.set(FalseNegative, Recovered, r.recovery);

        m.set(KnownSymptomaticQuarantined, RecoveredQuarantined, r.recovery);
        m.set(KnownSymptomaticQuarantined, Dead, r.death);

        m.set(Recovered, UnknownNotInfected, r.immunity_loss);
        m.set(Recovered, RecoveredQuarantined, trace.recovered);

        m.set(RecoveredQuarantined, Recovered, active.quarantine_exit.recovered);

        m.fill_diagonal();
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;

    fn short_model(days: usize) -> EpidemicModel {
        EpidemicModel::new(EpidemicParams {
            horizon_days: days,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = EpidemicParams {
            population: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            EpidemicModel::new(params),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_epidemic_grows_without_intervention() {
        let model = short_model(60);
        let t = model
            .simulate(&ScenarioParams::baseline(), &Policy::no_intervention())
            .unwrap();
        assert_eq!(t.num_days(), 60);
        assert!(t.infected[59] > t.infected[0]);
        assert!(t.dead[59] > 0.0);
        assert!(t.force_of_infection[10] > 0.0);
    }

    #[test]
    fn test_lockdown_slows_spread() {
        let model = short_model(90);
        let scenario = ScenarioParams::baseline();
        let free = model.simulate(&scenario, &Policy::no_intervention()).unwrap();
        let locked = model
            .simulate(
                &scenario,
                &Policy::new(Schedule::from_points([(0, 0.5)]), Schedule::Absent),
            )
            .unwrap();
        assert!(locked.infected[89] < free.infected[89]);
        assert!(locked.total_output < free.total_output);
    }

    #[test]
    fn test_outbreak_start_is_after_detection() {
        let model = short_model(120);
        let scenario = ScenarioParams {
            experiment_start: ExperimentStart::AfterOutbreak {
                reported_threshold: 100.0,
                offset_days: 14,
            },
            ..ScenarioParams::baseline()
        };
        let start = model.resolve_experiment_start(&scenario).unwrap();
        assert_ne!(start, usize::MAX);
        assert_eq!(start % 14, 0);
        assert!(start >= 15 * 14);
    }

    #[test]
    fn test_unreachable_threshold_never_starts() {
        let model = short_model(10);
        let scenario = ScenarioParams {
            experiment_start: ExperimentStart::AfterOutbreak {
                reported_threshold: f64::INFINITY,
                offset_days: 14,
            },
            ..ScenarioParams::baseline()
        };
        assert_eq!(model.resolve_experiment_start(&scenario).unwrap(), usize::MAX);
    }
}
