//! Objective evaluation
//!
//! Reduces one simulated policy to three objectives and one constraint:
//!
//! | objective        | in-horizon term                         | terminal term (× H / T)           |
//! |------------------|-----------------------------------------|-----------------------------------|
//! | deaths           | final cumulative deaths per thousand    | last daily death increment        |
//! | economic impact  | −(total output) / T                     | −(last daily output)              |
//! | peak strain      | max(0, p_ICU·peak symptomatic − C/N)    | max(0, p_ICU·last symptomatic − C/N), × H only |
//!
//! `H` is half the post-horizon recovery period in steps and `T` the number
//! of simulated steps. The constraint is the normalized excess of the peak
//! daily test count over its limit; feasible when ≤ 0.

use crate::config::params::{non_negative, positive, unit_interval};
use crate::config::scenario::ScenarioParams;
use crate::config::ConfigError;
use crate::engine::{EpidemicModel, SimulationError, Trajectories};
use crate::problem::layout::{DecisionLayout, DecodeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evaluation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl EvaluationError {
    /// Fatal errors halt the whole optimization; the rest are confined to
    /// the individual that caused them
    pub fn is_fatal(&self) -> bool {
        match self {
            EvaluationError::Simulation(_) => true,
            EvaluationError::Decode(_) => false,
        }
    }
}

impl From<ConfigError> for EvaluationError {
    fn from(err: ConfigError) -> Self {
        EvaluationError::Simulation(SimulationError::InvalidConfig(err))
    }
}

/// Evaluator constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Daily test capacity; the constraint is normalized by it
    pub max_daily_tests: f64,

    /// Fraction of symptomatic cases needing intensive care
    pub icu_fraction: f64,

    /// Hospital capacity (persons)
    pub hospital_capacity: f64,

    /// Assumed recovery period after the horizon, in years
    pub recovery_years: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_daily_tests: 10_000_000.0,
            icu_fraction: 0.01,
            hospital_capacity: 100_000.0,
            recovery_years: 0.5,
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_daily_tests", self.max_daily_tests)?;
        unit_interval("icu_fraction", self.icu_fraction)?;
        non_negative("hospital_capacity", self.hospital_capacity)?;
        non_negative("recovery_years", self.recovery_years)?;
        Ok(())
    }
}

/// One objective split into its in-horizon and terminal parts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectiveTerm {
    pub in_horizon: f64,
    pub terminal: f64,
}

impl ObjectiveTerm {
    pub fn total(&self) -> f64 {
        self.in_horizon + self.terminal
    }
}

/// Objectives and constraint for one policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Deaths per thousand
    pub deaths: ObjectiveTerm,
    /// Negative output; lower is better
    pub economic_impact: ObjectiveTerm,
    /// Peak ICU demand above capacity, as a population fraction
    pub peak_strain: ObjectiveTerm,
    /// `(peak daily tests − limit) / limit`
    pub constraint: f64,
}

impl Evaluation {
    /// Labels of [`Evaluation::objectives`], in order
    pub const OBJECTIVE_LABELS: [&'static str; 3] =
        ["Deaths", "Economic impact", "Peak Symptomatics"];

    /// Label of [`Evaluation::constraint`]
    pub const CONSTRAINT_LABEL: &'static str = "Max daily tests marginal";

    pub fn objectives(&self) -> [f64; 3] {
        [
            self.deaths.total(),
            self.economic_impact.total(),
            self.peak_strain.total(),
        ]
    }

    pub fn is_feasible(&self) -> bool {
        self.constraint <= 0.0
    }
}

/// Decision vector → simulation → objectives
///
/// Holds the model, a scenario whose experiment start is already resolved,
/// and the decision layout. Shared immutably across worker threads.
#[derive(Debug, Clone)]
pub struct ObjectiveEvaluator {
    model: EpidemicModel,
    scenario: ScenarioParams,
    layout: DecisionLayout,
    config: EvaluatorConfig,
}

impl ObjectiveEvaluator {
    /// Build an evaluator; resolves the experiment start once
    pub fn new(
        model: EpidemicModel,
        scenario: &ScenarioParams,
        layout: DecisionLayout,
        config: EvaluatorConfig,
    ) -> Result<Self, EvaluationError> {
        config.validate()?;
        let scenario = model.resolve_scenario(scenario)?;
        Ok(Self {
            model,
            scenario,
            layout,
            config,
        })
    }

    pub fn model(&self) -> &EpidemicModel {
        &self.model
    }

    pub fn scenario(&self) -> &ScenarioParams {
        &self.scenario
    }

    pub fn layout(&self) -> &DecisionLayout {
        &self.layout
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Decode, simulate and reduce one decision vector
    pub fn evaluate(&self, x: &[f64]) -> Result<Evaluation, EvaluationError> {
        let policy = self.layout.decode(x)?;
        let trajectories = self.model.simulate(&self.scenario, &policy)?;
        Ok(self.reduce(&trajectories))
    }

    /// Objectives and constraint of a finished simulation
    pub fn reduce(&self, t: &Trajectories) -> Evaluation {
        let population = self.model.params().population;
        let steps = t.total_steps.max(1) as f64;
        let half_period = self.model.grid().years_to_steps(self.config.recovery_years) as f64 / 2.0;
        let per_thousand = population / 1000.0;
        let capacity = self.config.hospital_capacity / population;
        let icu = self.config.icu_fraction;

        let last = |series: &[f64]| series.last().copied().unwrap_or(0.0);
        let dead_last = last(&t.dead);
        let dead_prev = t
            .dead
            .len()
            .checked_sub(2)
            .and_then(|i| t.dead.get(i).copied())
            .unwrap_or(0.0);

        let deaths = ObjectiveTerm {
            in_horizon: dead_last * per_thousand,
            terminal: half_period * ((dead_last - dead_prev) * per_thousand) / steps,
        };
        let economic_impact = ObjectiveTerm {
            in_horizon: -t.total_output / steps,
            terminal: half_period * (-last(&t.output)) / steps,
        };
        let peak_strain = ObjectiveTerm {
            in_horizon: (icu * t.peak_symptomatic() - capacity).max(0.0),
            terminal: half_period * (icu * last(&t.symptomatic) - capacity).max(0.0),
        };

        let limit = self.config.max_daily_tests;
        Evaluation {
            deaths,
            economic_impact,
            peak_strain,
            constraint: (t.peak_daily_tests() - limit) / limit,
        }
    }
}
