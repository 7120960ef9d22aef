//! Optimization problem
//!
//! The contract between the epidemic model and any optimizer that can
//! minimize real-valued objectives under inequality constraints over a
//! box domain.
//!
//! # Batch evaluation
//!
//! Individuals are independent. [`PolicyProblem`] evaluates them in
//! parallel and collects results in input order. A per-individual failure
//! (a malformed decision vector) is logged and scored `+∞` on every
//! objective and constraint; a fatal failure (an invalid transition
//! matrix) aborts the whole batch.

pub mod layout;

pub use layout::{DecisionLayout, DecodeError};

use crate::config::{ConfigError, ScenarioParams};
use crate::engine::EpidemicModel;
use crate::objective::{Evaluation, EvaluationError, EvaluatorConfig, ObjectiveEvaluator};
use crate::schedule::ControlDays;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Objectives per individual
pub const N_OBJECTIVES: usize = 3;

/// Constraints per individual
pub const N_CONSTRAINTS: usize = 1;

/// Control days and bounds of one sub-policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyControls {
    pub days: ControlDays,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl PolicyControls {
    /// No decision variables
    pub fn absent() -> Self {
        Self {
            days: ControlDays::Absent,
            lower: Vec::new(),
            upper: Vec::new(),
        }
    }

    /// The same bounds on every control day
    pub fn uniform(days: Vec<u32>, lower: f64, upper: f64) -> Self {
        let n = days.len();
        Self {
            days: ControlDays::Days(days),
            lower: vec![lower; n],
            upper: vec![upper; n],
        }
    }

    /// Check bound lengths, that control days are distinct and that every
    /// bound lies in `[min, max]` with `lower <= upper`
    pub fn validate(&self, policy: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        if let Some(day) = self.days.days().iter().find(|day| !seen.insert(**day)) {
            return Err(ConfigError::Invalid(format!(
                "{} control day {} appears more than once",
                policy, day
            )));
        }

        let days = self.days.len();
        if self.lower.len() != days || self.upper.len() != days {
            return Err(ConfigError::BoundsMismatch {
                policy,
                days,
                lower: self.lower.len(),
                upper: self.upper.len(),
            });
        }
        for (lo, hi) in self.lower.iter().zip(&self.upper) {
            if !(lo.is_finite() && hi.is_finite()) || *lo < min || *hi > max || lo > hi {
                return Err(ConfigError::Invalid(format!(
                    "{} bounds [{}, {}] not within [{}, {}]",
                    policy, lo, hi, min, max
                )));
            }
        }
        Ok(())
    }
}

/// Objective and constraint matrices of one batch, rows in input order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub f: Vec<Vec<f64>>,
    pub g: Vec<Vec<f64>>,
}

impl BatchEvaluation {
    pub fn len(&self) -> usize {
        self.f.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }
}

/// What an optimizer needs from a problem
pub trait Problem: Sync {
    fn n_var(&self) -> usize;

    fn n_obj(&self) -> usize;

    fn n_constr(&self) -> usize;

    /// Per-variable lower and upper bounds
    fn bounds(&self) -> (Vec<f64>, Vec<f64>);

    /// Evaluate a batch of decision vectors
    ///
    /// Returns `Err` only for failures that invalidate the whole run.
    fn evaluate(&self, population: &[Vec<f64>]) -> Result<BatchEvaluation, EvaluationError>;
}

/// Policy search over lockdown and testing control values
#[derive(Debug, Clone)]
pub struct PolicyProblem {
    evaluator: ObjectiveEvaluator,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl PolicyProblem {
    pub fn new(
        model: EpidemicModel,
        scenario: &ScenarioParams,
        lockdown: &PolicyControls,
        testing: &PolicyControls,
        config: EvaluatorConfig,
    ) -> Result<Self, EvaluationError> {
        lockdown.validate("lockdown", f64::MIN_POSITIVE, 1.0)?;
        testing.validate("testing", 0.0, 1.0)?;

        let layout = DecisionLayout::new(lockdown.days.clone(), testing.days.clone());
        let lower = lockdown.lower.iter().chain(&testing.lower).copied().collect();
        let upper = lockdown.upper.iter().chain(&testing.upper).copied().collect();
        Ok(Self {
            evaluator: ObjectiveEvaluator::new(model, scenario, layout, config)?,
            lower,
            upper,
        })
    }

    pub fn evaluator(&self) -> &ObjectiveEvaluator {
        &self.evaluator
    }

    pub fn layout(&self) -> &DecisionLayout {
        self.evaluator.layout()
    }

    /// Evaluate every individual, keeping the full objective breakdown
    pub fn evaluate_detailed(
        &self,
        population: &[Vec<f64>],
    ) -> Vec<Result<Evaluation, EvaluationError>> {
        population
            .par_iter()
            .map(|x| self.evaluator.evaluate(x))
            .collect()
    }
}

impl Problem for PolicyProblem {
    fn n_var(&self) -> usize {
        self.layout().n_var()
    }

    fn n_obj(&self) -> usize {
        N_OBJECTIVES
    }

    fn n_constr(&self) -> usize {
        N_CONSTRAINTS
    }

    fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        (self.lower.clone(), self.upper.clone())
    }

    fn evaluate(&self, population: &[Vec<f64>]) -> Result<BatchEvaluation, EvaluationError> {
        let mut batch = BatchEvaluation {
            f: Vec::with_capacity(population.len()),
            g: Vec::with_capacity(population.len()),
        };

        for (index, result) in self.evaluate_detailed(population).into_iter().enumerate() {
            match result {
                Ok(evaluation) => {
                    batch.f.push(evaluation.objectives().to_vec());
                    batch.g.push(vec![evaluation.constraint]);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(individual = index, error = %err, "Evaluation failed, scoring as infeasible");
                    batch.f.push(vec![f64::INFINITY; N_OBJECTIVES]);
                    batch.g.push(vec![f64::INFINITY; N_CONSTRAINTS]);
                }
            }
        }
        Ok(batch)
    }
}
