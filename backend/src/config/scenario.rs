//! Per-scenario testing and quarantine behaviour
//!
//! Run configurations express rates per day ([`DailyScenarioRates`]); the
//! engine consumes per-step rates ([`ScenarioParams`]). Conversion uses the
//! compounding rule of [`TimeGrid::daily_to_step_rate`].

use super::params::{non_negative, unit_interval};
use super::ConfigError;
use crate::core::time::TimeGrid;
use serde::{Deserialize, Serialize};

/// Reported-case threshold used to detect the outbreak
pub const DEFAULT_REPORTED_THRESHOLD: f64 = 100.0;

/// Days between outbreak detection and the first intervention
pub const DEFAULT_POLICY_OFFSET_DAYS: usize = 14;

/// When the intervention phase begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStart {
    /// Interventions apply from the step after this one
    Step(usize),

    /// Run a no-intervention baseline and start `offset_days` after the
    /// day following the first day whose cumulative reported cases exceed
    /// `reported_threshold`
    AfterOutbreak {
        reported_threshold: f64,
        offset_days: usize,
    },
}

impl ExperimentStart {
    /// Interventions never start
    pub const NEVER: ExperimentStart = ExperimentStart::Step(usize::MAX);
}

impl Default for ExperimentStart {
    fn default() -> Self {
        ExperimentStart::AfterOutbreak {
            reported_threshold: DEFAULT_REPORTED_THRESHOLD,
            offset_days: DEFAULT_POLICY_OFFSET_DAYS,
        }
    }
}

/// Per-step scenario rates consumed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub test_sensitivity: f64,
    pub test_specificity: f64,

    /// General testing probability per step, used wherever the testing
    /// schedule has no control point yet
    pub testing_rate: f64,

    /// Trace-testing probability per step for quarantined unknowns
    pub trace_testing_rate: f64,

    /// Quarantine entry rates per knowledge state
    pub quarantine_entry: QuarantineRates,

    /// Quarantine exit rates per knowledge state
    pub quarantine_exit: QuarantineExitRates,

    pub experiment_start: ExperimentStart,
}

/// Quarantine-entry rates, per step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuarantineRates {
    pub unknown: f64,
    pub positive: f64,
    pub negative: f64,
    pub recovered: f64,
}

/// Quarantine-exit rates, per step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuarantineExitRates {
    pub unknown: f64,
    pub positive: f64,
    pub asymptomatic_positive: f64,
    pub negative: f64,
    pub recovered: f64,
}

impl ScenarioParams {
    /// No testing, no quarantine, no interventions at any step
    pub fn baseline() -> Self {
        Self {
            test_sensitivity: 1.0,
            test_specificity: 1.0,
            testing_rate: 0.0,
            trace_testing_rate: 0.0,
            quarantine_entry: QuarantineRates::default(),
            quarantine_exit: QuarantineExitRates::default(),
            experiment_start: ExperimentStart::NEVER,
        }
    }

    /// Same rates with a concrete start step
    pub fn with_start_step(&self, step: usize) -> Self {
        Self {
            experiment_start: ExperimentStart::Step(step),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("test_sensitivity", self.test_sensitivity)?;
        unit_interval("test_specificity", self.test_specificity)?;
        unit_interval("testing_rate", self.testing_rate)?;
        unit_interval("trace_testing_rate", self.trace_testing_rate)?;

        let entry = &self.quarantine_entry;
        unit_interval("quarantine_entry.unknown", entry.unknown)?;
        unit_interval("quarantine_entry.positive", entry.positive)?;
        unit_interval("quarantine_entry.negative", entry.negative)?;
        unit_interval("quarantine_entry.recovered", entry.recovered)?;

        let exit = &self.quarantine_exit;
        unit_interval("quarantine_exit.unknown", exit.unknown)?;
        unit_interval("quarantine_exit.positive", exit.positive)?;
        unit_interval("quarantine_exit.asymptomatic_positive", exit.asymptomatic_positive)?;
        unit_interval("quarantine_exit.negative", exit.negative)?;
        unit_interval("quarantine_exit.recovered", exit.recovered)?;

        if let ExperimentStart::AfterOutbreak {
            reported_threshold, ..
        } = self.experiment_start
        {
            non_negative("reported_threshold", reported_threshold)?;
        }
        Ok(())
    }
}

/// Scenario rates as configured: probabilities per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyScenarioRates {
    pub testing_rate: f64,
    pub test_sensitivity: f64,
    pub test_specificity: f64,
    pub trace_testing_rate: f64,

    pub unknown_q_rate: f64,
    pub positive_q_rate: f64,
    pub negative_q_rate: f64,
    pub recovered_q_rate: f64,

    pub unknown_exit_rate: f64,
    pub positive_exit_rate: f64,
    pub asymptomatic_positive_exit_rate: f64,
    pub negative_exit_rate: f64,
    pub recovered_exit_rate: f64,

    pub experiment_start: ExperimentStart,
}

impl Default for DailyScenarioRates {
    fn default() -> Self {
        Self {
            testing_rate: 0.0,
            test_sensitivity: 1.0,
            test_specificity: 1.0,
            trace_testing_rate: 0.0,
            unknown_q_rate: 0.0,
            positive_q_rate: 0.999,
            negative_q_rate: 0.0,
            recovered_q_rate: 0.0,
            unknown_exit_rate: 0.10,
            positive_exit_rate: 0.0,
            asymptomatic_positive_exit_rate: 0.0,
            negative_exit_rate: 0.98,
            recovered_exit_rate: 0.999,
            experiment_start: ExperimentStart::default(),
        }
    }
}

impl DailyScenarioRates {
    /// Convert to per-step rates on `grid` and validate
    ///
    /// Sensitivity and specificity are probabilities per test and are
    /// carried over unchanged.
    pub fn to_step_params(&self, grid: &TimeGrid) -> Result<ScenarioParams, ConfigError> {
        for (field, value) in [
            ("testing_rate", self.testing_rate),
            ("trace_testing_rate", self.trace_testing_rate),
            ("unknown_q_rate", self.unknown_q_rate),
            ("positive_q_rate", self.positive_q_rate),
            ("negative_q_rate", self.negative_q_rate),
            ("recovered_q_rate", self.recovered_q_rate),
            ("unknown_exit_rate", self.unknown_exit_rate),
            ("positive_exit_rate", self.positive_exit_rate),
            ("asymptomatic_positive_exit_rate", self.asymptomatic_positive_exit_rate),
            ("negative_exit_rate", self.negative_exit_rate),
            ("recovered_exit_rate", self.recovered_exit_rate),
        ] {
            unit_interval(field, value)?;
        }

        let step = |daily: f64| grid.daily_to_step_rate(daily);
        let params = ScenarioParams {
            test_sensitivity: self.test_sensitivity,
            test_specificity: self.test_specificity,
            testing_rate: step(self.testing_rate),
            trace_testing_rate: step(self.trace_testing_rate),
            quarantine_entry: QuarantineRates {
                unknown: step(self.unknown_q_rate),
                positive: step(self.positive_q_rate),
                negative: step(self.negative_q_rate),
                recovered: step(self.recovered_q_rate),
            },
            quarantine_exit: QuarantineExitRates {
                unknown: step(self.unknown_exit_rate),
                positive: step(self.positive_exit_rate),
                asymptomatic_positive: step(self.asymptomatic_positive_exit_rate),
                negative: step(self.negative_exit_rate),
                recovered: step(self.recovered_exit_rate),
            },
            experiment_start: self.experiment_start,
        };
        params.validate()?;
        Ok(params)
    }
}
