//! Run configuration
//!
//! A [`RunConfig`] is everything one optimization run needs. Runs are
//! described as [`RunOverrides`] on top of [`RunConfig::default`]; applying
//! overrides returns a new validated configuration and never touches the
//! defaults.
//!
//! Override keys follow the run-definition vocabulary of the original
//! study (`R_0`, `eta`, `tau_TT_daily`, `T_rec`, ...) as aliases of the
//! descriptive field names.

use super::params::EpidemicParams;
use super::scenario::{DailyScenarioRates, ScenarioParams};
use super::ConfigError;
use crate::engine::EpidemicModel;
use crate::objective::{EvaluationError, EvaluatorConfig};
use crate::optimizer::OptimizerConfig;
use crate::problem::{PolicyControls, PolicyProblem};
use crate::schedule::ControlDays;
use serde::{Deserialize, Serialize};

/// Default control days shared by both sub-policies
pub const DEFAULT_CONTROL_DAYS: [u32; 15] =
    [1, 15, 30, 60, 90, 120, 150, 200, 250, 300, 350, 400, 450, 500, 600];

pub const DEFAULT_LOCKDOWN_BOUNDS: (f64, f64) = (0.5, 1.0);

/// Per-step testing probability bounds
pub const DEFAULT_TESTING_BOUNDS: (f64, f64) = (0.0, 0.02);

/// One fully resolved optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub epidemic: EpidemicParams,
    pub scenario: DailyScenarioRates,
    pub lockdown: PolicyControls,
    pub testing: PolicyControls,
    pub evaluator: EvaluatorConfig,
    pub optimizer: OptimizerConfig,
    /// Generation cap fixed by the run itself; takes precedence over the
    /// cap given on the command line
    pub max_generations: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let (ld_lo, ld_hi) = DEFAULT_LOCKDOWN_BOUNDS;
        let (t_lo, t_hi) = DEFAULT_TESTING_BOUNDS;
        Self {
            epidemic: EpidemicParams::default(),
            scenario: DailyScenarioRates::default(),
            lockdown: PolicyControls::uniform(DEFAULT_CONTROL_DAYS.to_vec(), ld_lo, ld_hi),
            testing: PolicyControls::uniform(DEFAULT_CONTROL_DAYS.to_vec(), t_lo, t_hi),
            evaluator: EvaluatorConfig::default(),
            optimizer: OptimizerConfig::default(),
            max_generations: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.epidemic.validate()?;
        self.scenario.to_step_params(&self.epidemic.time_grid())?;
        self.lockdown.validate("lockdown", f64::MIN_POSITIVE, 1.0)?;
        self.testing.validate("testing", 0.0, 1.0)?;
        self.evaluator.validate()?;
        self.optimizer.validate()?;
        if self.max_generations == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "max_generations",
                value: 0.0,
                expected: "> 0",
            });
        }
        Ok(())
    }

    /// A copy with `overrides` applied, validated
    pub fn with_overrides(&self, overrides: &RunOverrides) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        overrides.apply(&mut next)?;
        next.validate()?;
        Ok(next)
    }

    /// Per-step scenario rates on this run's time grid
    pub fn scenario_params(&self) -> Result<ScenarioParams, ConfigError> {
        self.scenario.to_step_params(&self.epidemic.time_grid())
    }

    /// Generation cap for this run given the command-line cap
    pub fn generation_cap(&self, cli_max: usize) -> usize {
        self.max_generations.unwrap_or(cli_max)
    }

    /// Build the model and the optimization problem
    ///
    /// Resolves the experiment start, which may run one baseline simulation.
    pub fn build_problem(&self) -> Result<PolicyProblem, EvaluationError> {
        let model = EpidemicModel::new(self.epidemic.clone())?;
        let scenario = self.scenario_params()?;
        PolicyProblem::new(
            model,
            &scenario,
            &self.lockdown,
            &self.testing,
            self.evaluator.clone(),
        )
    }
}

/// Control days as written in a run definition: a list of days, or the
/// keyword `"NA"` / `"absent"` for no decision variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlDaysOverride {
    Days(Vec<u32>),
    Keyword(String),
}

impl ControlDaysOverride {
    pub fn absent() -> Self {
        ControlDaysOverride::Keyword("NA".to_string())
    }

    fn resolve(&self) -> Result<ControlDays, ConfigError> {
        match self {
            ControlDaysOverride::Days(days) => Ok(ControlDays::Days(days.clone())),
            ControlDaysOverride::Keyword(k) if k == "NA" || k.eq_ignore_ascii_case("absent") => {
                Ok(ControlDays::Absent)
            }
            ControlDaysOverride::Keyword(other) => Err(ConfigError::Invalid(format!(
                "control days must be a list or \"NA\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Named overrides on top of [`RunConfig::default`]
///
/// Every field is optional; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOverrides {
    // Policy layout
    pub lockdown_policy_control_days: Option<ControlDaysOverride>,
    pub lockdown_policy_lower_limits: Option<Vec<f64>>,
    pub lockdown_policy_upper_limits: Option<Vec<f64>>,
    pub testing_policy_control_days: Option<ControlDaysOverride>,
    pub testing_policy_lower_limits: Option<Vec<f64>>,
    pub testing_policy_upper_limits: Option<Vec<f64>>,

    // Evaluator
    pub max_daily_tests: Option<f64>,
    #[serde(alias = "p_ICU")]
    pub icu_fraction: Option<f64>,
    #[serde(alias = "C_hos")]
    pub hospital_capacity: Option<f64>,
    #[serde(alias = "T_rec")]
    pub recovery_years: Option<f64>,

    // Epidemic
    pub population: Option<f64>,
    pub horizon_days: Option<usize>,
    #[serde(alias = "R_0")]
    pub r0: Option<f64>,
    #[serde(alias = "delta_param")]
    pub days_to_symptoms: Option<f64>,
    #[serde(alias = "omegaR_param")]
    pub days_to_recovery: Option<f64>,
    #[serde(alias = "pii_D")]
    pub case_fatality: Option<f64>,
    #[serde(alias = "gamma_param")]
    pub immunity_days: Option<f64>,
    #[serde(alias = "rel_rho")]
    pub asymptomatic_relative_infectiousness: Option<f64>,
    #[serde(alias = "rel_lambda_param")]
    pub quarantine_contact_multiplier: Option<f64>,
    #[serde(alias = "lambda_param")]
    pub contact_rate: Option<f64>,
    #[serde(alias = "initial_infect")]
    pub initial_asymptomatic: Option<f64>,
    #[serde(alias = "A_rel")]
    pub quarantine_productivity: Option<f64>,
    #[serde(alias = "d_vaccine")]
    pub vaccine_step: Option<usize>,
    #[serde(alias = "eta")]
    pub trace_efficiency: Option<f64>,
    #[serde(alias = "testing_cost")]
    pub test_cost: Option<f64>,

    // Scenario (daily rates)
    #[serde(alias = "daily_testing_rate")]
    pub testing_rate: Option<f64>,
    #[serde(alias = "testing_sensitivity")]
    pub test_sensitivity: Option<f64>,
    #[serde(alias = "testing_specificity")]
    pub test_specificity: Option<f64>,
    #[serde(alias = "tau_TT_daily")]
    pub trace_testing_rate: Option<f64>,
    #[serde(alias = "r_U")]
    pub unknown_exit_rate: Option<f64>,
    #[serde(alias = "r_P")]
    pub positive_exit_rate: Option<f64>,
    #[serde(alias = "r_AP")]
    pub asymptomatic_positive_exit_rate: Option<f64>,
    #[serde(alias = "r_N")]
    pub negative_exit_rate: Option<f64>,
    #[serde(alias = "r_R")]
    pub recovered_exit_rate: Option<f64>,
    pub unknown_q_rate: Option<f64>,
    pub positive_q_rate: Option<f64>,
    pub negative_q_rate: Option<f64>,
    pub recovered_q_rate: Option<f64>,

    // Optimizer
    #[serde(alias = "n_gen")]
    pub max_generations: Option<usize>,
    pub pop_size: Option<usize>,
    pub n_offsprings: Option<usize>,
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

impl RunOverrides {
    fn apply(&self, cfg: &mut RunConfig) -> Result<(), ConfigError> {
        apply_controls(
            &mut cfg.lockdown,
            &self.lockdown_policy_control_days,
            &self.lockdown_policy_lower_limits,
            &self.lockdown_policy_upper_limits,
        )?;
        apply_controls(
            &mut cfg.testing,
            &self.testing_policy_control_days,
            &self.testing_policy_lower_limits,
            &self.testing_policy_upper_limits,
        )?;

        let ev = &mut cfg.evaluator;
        set(&mut ev.max_daily_tests, &self.max_daily_tests);
        set(&mut ev.icu_fraction, &self.icu_fraction);
        set(&mut ev.hospital_capacity, &self.hospital_capacity);
        set(&mut ev.recovery_years, &self.recovery_years);

        let ep = &mut cfg.epidemic;
        set(&mut ep.population, &self.population);
        set(&mut ep.horizon_days, &self.horizon_days);
        set(&mut ep.r0, &self.r0);
        set(&mut ep.days_to_symptoms, &self.days_to_symptoms);
        set(&mut ep.days_to_recovery, &self.days_to_recovery);
        set(&mut ep.case_fatality, &self.case_fatality);
        set(&mut ep.immunity_days, &self.immunity_days);
        set(
            &mut ep.asymptomatic_relative_infectiousness,
            &self.asymptomatic_relative_infectiousness,
        );
        set(&mut ep.quarantine_contact_multiplier, &self.quarantine_contact_multiplier);
        set(&mut ep.contact_rate, &self.contact_rate);
        set(&mut ep.initial_asymptomatic, &self.initial_asymptomatic);
        set(&mut ep.quarantine_productivity, &self.quarantine_productivity);
        set(&mut ep.vaccine_step, &self.vaccine_step);
        set(&mut ep.trace_efficiency, &self.trace_efficiency);
        set(&mut ep.test_cost, &self.test_cost);

        let sc = &mut cfg.scenario;
        set(&mut sc.testing_rate, &self.testing_rate);
        set(&mut sc.test_sensitivity, &self.test_sensitivity);
        set(&mut sc.test_specificity, &self.test_specificity);
        set(&mut sc.trace_testing_rate, &self.trace_testing_rate);
        set(&mut sc.unknown_exit_rate, &self.unknown_exit_rate);
        set(&mut sc.positive_exit_rate, &self.positive_exit_rate);
        set(
            &mut sc.asymptomatic_positive_exit_rate,
            &self.asymptomatic_positive_exit_rate,
        );
        set(&mut sc.negative_exit_rate, &self.negative_exit_rate);
        set(&mut sc.recovered_exit_rate, &self.recovered_exit_rate);
        set(&mut sc.unknown_q_rate, &self.unknown_q_rate);
        set(&mut sc.positive_q_rate, &self.positive_q_rate);
        set(&mut sc.negative_q_rate, &self.negative_q_rate);
        set(&mut sc.recovered_q_rate, &self.recovered_q_rate);

        if self.max_generations.is_some() {
            cfg.max_generations = self.max_generations;
        }
        set(&mut cfg.optimizer.pop_size, &self.pop_size);
        set(&mut cfg.optimizer.n_offsprings, &self.n_offsprings);
        Ok(())
    }
}

/// Absent days clear both bounds; explicit bounds replace the defaults
fn apply_controls(
    controls: &mut PolicyControls,
    days: &Option<ControlDaysOverride>,
    lower: &Option<Vec<f64>>,
    upper: &Option<Vec<f64>>,
) -> Result<(), ConfigError> {
    if let Some(days) = days {
        controls.days = days.resolve()?;
    }
    if controls.days.is_absent() {
        *controls = PolicyControls::absent();
        return Ok(());
    }
    set(&mut controls.lower, lower);
    set(&mut controls.upper, upper);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_is_valid() {
        let cfg = RunConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.lockdown.days.len(), 15);
        assert_eq!(cfg.testing.upper, vec![0.02; 15]);
    }

    #[test]
    fn test_original_keys_accepted() {
        let overrides: RunOverrides = serde_json::from_str(
            r#"{
                "lockdown_policy_control_days": "NA",
                "lockdown_policy_lower_limits": [],
                "lockdown_policy_upper_limits": [],
                "R_0": 4.0,
                "eta": 0.5,
                "tau_TT_daily": 0.5,
                "T_rec": 1.0,
                "delta_param": 6
            }"#,
        )
        .unwrap();
        let cfg = RunConfig::default().with_overrides(&overrides).unwrap();
        assert!(cfg.lockdown.days.is_absent());
        assert!(cfg.lockdown.lower.is_empty());
        assert_eq!(cfg.epidemic.r0, 4.0);
        assert_eq!(cfg.epidemic.trace_efficiency, 0.5);
        assert_eq!(cfg.scenario.trace_testing_rate, 0.5);
        assert_eq!(cfg.evaluator.recovery_years, 1.0);
        assert_eq!(cfg.epidemic.days_to_symptoms, 6.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let parsed: Result<RunOverrides, _> = serde_json::from_str(r#"{"R_zero": 4.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_overrides_leave_defaults_untouched() {
        let base = RunConfig::default();
        let overrides = RunOverrides {
            r0: Some(1.25),
            ..Default::default()
        };
        let next = base.with_overrides(&overrides).unwrap();
        assert_eq!(next.epidemic.r0, 1.25);
        assert_eq!(base.epidemic.r0, 2.5);
        assert_eq!(RunConfig::default(), base);
    }

    #[test]
    fn test_new_days_keep_matching_default_bounds() {
        let overrides = RunOverrides {
            testing_policy_control_days: Some(ControlDaysOverride::Days(vec![
                28, 29, 30, 60, 90, 120, 150, 200, 250, 300, 350, 400, 450, 500, 600,
            ])),
            ..Default::default()
        };
        let cfg = RunConfig::default().with_overrides(&overrides).unwrap();
        assert_eq!(cfg.testing.days.days()[0], 28);
        assert_eq!(cfg.testing.lower.len(), 15);
    }

    #[test]
    fn test_days_without_matching_bounds_rejected() {
        let overrides = RunOverrides {
            lockdown_policy_control_days: Some(ControlDaysOverride::Days(vec![1, 15])),
            ..Default::default()
        };
        assert!(matches!(
            RunConfig::default().with_overrides(&overrides),
            Err(ConfigError::BoundsMismatch {
                policy: "lockdown",
                days: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_bad_keyword_rejected() {
        let overrides = RunOverrides {
            testing_policy_control_days: Some(ControlDaysOverride::Keyword("none".into())),
            ..Default::default()
        };
        assert!(RunConfig::default().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_run_generation_cap_wins() {
        let mut cfg = RunConfig::default();
        assert_eq!(cfg.generation_cap(200), 200);
        cfg.max_generations = Some(1);
        assert_eq!(cfg.generation_cap(200), 1);
    }
}
