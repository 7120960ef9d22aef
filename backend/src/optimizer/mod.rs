//! NSGA-II multi-objective optimizer
//!
//! Generic over [`Problem`]; knows nothing about epidemics.
//!
//! # Generation loop
//!
//! ```text
//! 1. Sample the initial population uniformly within bounds, evaluate
//! 2. Repeat until a termination criterion fires:
//!    a. Binary tournaments on (violation, rank, crowding) pick parents
//!    b. SBX crossover, polynomial mutation, drop duplicates
//!    c. Evaluate offspring
//!    d. Survival: merge, keep the best `pop_size` by rank then crowding
//! 3. Return the non-dominated feasible set (or the least-violating point)
//! ```
//!
//! All randomness comes from one seeded [`RngManager`], and batch results
//! come back in input order, so a seed reproduces a run exactly.

pub mod operators;
pub mod sorting;
pub mod termination;

pub use termination::{StopReason, TerminationConfig};

use crate::config::params::{non_negative, unit_interval};
use crate::config::ConfigError;
use crate::objective::EvaluationError;
use crate::problem::Problem;
use crate::rng::RngManager;
use operators::{polynomial_mutation, sbx};
use serde::{Deserialize, Serialize};
use sorting::{constrained_dominates, constraint_violation, crowding_distance, non_dominated_fronts};
use std::cmp::Ordering;
use termination::{Snapshot, Termination};
use tracing::{debug, info};

/// Two decision vectors closer than this in every coordinate are duplicates
const DUPLICATE_EPS: f64 = 1e-16;

/// Mating rounds per generation before giving up on filling the offspring
const MAX_MATING_ROUNDS: usize = 100;

/// NSGA-II settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub pop_size: usize,
    pub n_offsprings: usize,
    pub crossover_prob: f64,
    pub crossover_eta: f64,
    pub mutation_eta: f64,
    /// Per-variable mutation probability; `None` means `1 / n_var`
    pub mutation_prob: Option<f64>,
    pub eliminate_duplicates: bool,
    pub termination: TerminationConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            pop_size: 60,
            n_offsprings: 30,
            crossover_prob: 0.9,
            crossover_eta: 10.0,
            mutation_eta: 8.0,
            mutation_prob: None,
            eliminate_duplicates: true,
            termination: TerminationConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pop_size < 2 {
            return Err(ConfigError::OutOfRange {
                field: "pop_size",
                value: self.pop_size as f64,
                expected: ">= 2",
            });
        }
        if self.n_offsprings == 0 {
            return Err(ConfigError::OutOfRange {
                field: "n_offsprings",
                value: 0.0,
                expected: "> 0",
            });
        }
        unit_interval("crossover_prob", self.crossover_prob)?;
        non_negative("crossover_eta", self.crossover_eta)?;
        non_negative("mutation_eta", self.mutation_eta)?;
        if let Some(p) = self.mutation_prob {
            unit_interval("mutation_prob", p)?;
        }
        if self.termination.max_generations == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_generations",
                value: 0.0,
                expected: "> 0",
            });
        }
        Ok(())
    }
}

/// Final optimal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Decision vectors
    pub x: Vec<Vec<f64>>,
    /// Objective values, one row per decision vector
    pub f: Vec<Vec<f64>>,
    /// Constraint values, one row per decision vector
    pub g: Vec<Vec<f64>>,
    pub generations: usize,
    pub evaluations: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone)]
struct Individual {
    x: Vec<f64>,
    f: Vec<f64>,
    g: Vec<f64>,
    cv: f64,
    rank: usize,
    crowding: f64,
}

impl Individual {
    fn is_feasible(&self) -> bool {
        self.cv <= 0.0
    }
}

/// NSGA-II driver
#[derive(Debug, Clone)]
pub struct Nsga2 {
    config: OptimizerConfig,
    seed: u64,
}

impl Nsga2 {
    pub fn new(config: OptimizerConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, seed })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Minimize `problem`
    ///
    /// Returns `Err` only when the problem reports a fatal evaluation error.
    pub fn minimize<P: Problem>(&self, problem: &P) -> Result<OptimizationResult, EvaluationError> {
        let mut rng = RngManager::new(self.seed);
        let (lower, upper) = problem.bounds();
        let n_var = problem.n_var();

        info!(
            n_var,
            pop_size = self.config.pop_size,
            n_offsprings = self.config.n_offsprings,
            seed = self.seed,
            "Starting NSGA-II"
        );

        if n_var == 0 {
            let population = self.evaluate(problem, vec![Vec::new()])?;
            info!("No decision variables, evaluated the single policy");
            return Ok(result(&population, 1, 1, StopReason::NoVariables));
        }

        let initial: Vec<Vec<f64>> = self.fill_unique(
            &[],
            self.config.pop_size,
            |rng: &mut RngManager| {
                vec![lower
                    .iter()
                    .zip(&upper)
                    .map(|(lo, hi)| rng.uniform(*lo, *hi))
                    .collect()]
            },
            &mut rng,
        );
        let mut evaluations = initial.len();
        let mut population = self.evaluate(problem, initial)?;
        let pop_size = population.len();
        rank_and_crowd(&mut population);

        let mut termination = Termination::new(self.config.termination.clone());
        let mut generation = 1;

        let stop_reason = loop {
            if let Some(reason) = termination.update(generation, evaluations, snapshot(&population)) {
                break reason;
            }
            generation += 1;

            let mutation_prob = self.config.mutation_prob.unwrap_or(1.0 / n_var as f64);
            let offspring = self.fill_unique(
                &population,
                self.config.n_offsprings,
                |rng: &mut RngManager| {
                    let a = tournament(&population, rng);
                    let b = tournament(&population, rng);
                    let (c1, c2) = if rng.chance(self.config.crossover_prob) {
                        sbx(&population[a].x, &population[b].x, &lower, &upper, self.config.crossover_eta, rng)
                    } else {
                        (population[a].x.clone(), population[b].x.clone())
                    };
                    let mut children = vec![c1, c2];
                    for child in &mut children {
                        polynomial_mutation(child, &lower, &upper, self.config.mutation_eta, mutation_prob, rng);
                    }
                    children
                },
                &mut rng,
            );
            if offspring.is_empty() {
                debug!(generation, "No new offspring could be generated");
            }
            evaluations += offspring.len();
            let mut merged = population;
            merged.extend(self.evaluate(problem, offspring)?);
            population = survive(merged, pop_size);

            debug!(
                generation,
                evaluations,
                feasible = population.iter().filter(|i| i.is_feasible()).count(),
                front_size = population.iter().filter(|i| i.rank == 0).count(),
                "Generation complete"
            );
        };

        info!(generation, evaluations, ?stop_reason, "NSGA-II finished");
        Ok(result(&population, generation, evaluations, stop_reason))
    }

    fn evaluate<P: Problem>(&self, problem: &P, xs: Vec<Vec<f64>>) -> Result<Vec<Individual>, EvaluationError> {
        let batch = problem.evaluate(&xs)?;
        Ok(xs
            .into_iter()
            .zip(batch.f)
            .zip(batch.g)
            .map(|((x, f), g)| Individual {
                cv: constraint_violation(&g),
                x,
                f,
                g,
                rank: 0,
                crowding: 0.0,
            })
            .collect())
    }

    /// Draw batches of candidates until `count` are collected, skipping
    /// duplicates of `existing` and of each other when duplicate elimination
    /// is on
    ///
    /// Every candidate of a batch is kept while room remains; the surplus of
    /// the last batch is dropped.
    fn fill_unique<F>(&self, existing: &[Individual], count: usize, mut draw: F, rng: &mut RngManager) -> Vec<Vec<f64>>
    where
        F: FnMut(&mut RngManager) -> Vec<Vec<f64>>,
    {
        let mut out: Vec<Vec<f64>> = Vec::with_capacity(count);
        let max_draws = count.saturating_mul(MAX_MATING_ROUNDS);
        let mut draws = 0;
        while out.len() < count && draws < max_draws {
            draws += 1;
            for candidate in draw(rng) {
                if out.len() == count {
                    break;
                }
                if self.config.eliminate_duplicates
                    && (existing.iter().any(|i| is_duplicate(&i.x, &candidate))
                        || out.iter().any(|x| is_duplicate(x, &candidate)))
                {
                    continue;
                }
                out.push(candidate);
            }
        }
        out
    }
}

fn is_duplicate(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= DUPLICATE_EPS)
}

/// Binary tournament: lower violation, then lower rank, then larger crowding
fn tournament(population: &[Individual], rng: &mut RngManager) -> usize {
    let a = rng.index(population.len());
    let b = rng.index(population.len());
    let (ia, ib) = (&population[a], &population[b]);

    if !(ia.is_feasible() && ib.is_feasible()) {
        return match ia.cv.partial_cmp(&ib.cv) {
            Some(Ordering::Less) => a,
            Some(Ordering::Greater) => b,
            _ if rng.chance(0.5) => a,
            _ => b,
        };
    }
    if constrained_dominates(&ia.f, ia.cv, &ib.f, ib.cv) {
        return a;
    }
    if constrained_dominates(&ib.f, ib.cv, &ia.f, ia.cv) {
        return b;
    }
    match ia.crowding.partial_cmp(&ib.crowding) {
        Some(Ordering::Greater) => a,
        Some(Ordering::Less) => b,
        _ if rng.chance(0.5) => a,
        _ => b,
    }
}

/// Assign ranks and crowding distances
///
/// Feasible individuals are ranked by non-dominated fronts; infeasible ones
/// follow, one rank each, in order of increasing violation.
fn rank_and_crowd(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let feasible: Vec<usize> = (0..population.len()).filter(|&i| population[i].is_feasible()).collect();
    let mut infeasible: Vec<usize> = (0..population.len()).filter(|&i| !population[i].is_feasible()).collect();
    infeasible.sort_by(|&a, &b| {
        population[a]
            .cv
            .partial_cmp(&population[b].cv)
            .unwrap_or(Ordering::Equal)
    });

    let f: Vec<Vec<f64>> = feasible.iter().map(|&i| population[i].f.clone()).collect();
    let mut fronts: Vec<Vec<usize>> = non_dominated_fronts(&f)
        .into_iter()
        .map(|front| front.into_iter().map(|k| feasible[k]).collect())
        .collect();
    fronts.extend(infeasible.into_iter().map(|i| vec![i]));

    let all_f: Vec<Vec<f64>> = population.iter().map(|i| i.f.clone()).collect();
    for (rank, front) in fronts.iter().enumerate() {
        let distances = crowding_distance(&all_f, front);
        for (&i, d) in front.iter().zip(distances) {
            population[i].rank = rank;
            population[i].crowding = d;
        }
    }
    fronts
}

/// Keep the best `n` by rank, breaking the last front by crowding
fn survive(mut merged: Vec<Individual>, n: usize) -> Vec<Individual> {
    let fronts = rank_and_crowd(&mut merged);
    let mut keep: Vec<usize> = Vec::with_capacity(n);
    for front in fronts {
        if keep.len() + front.len() <= n {
            keep.extend(front);
            continue;
        }
        let mut front = front;
        front.sort_by(|&a, &b| {
            merged[b]
                .crowding
                .partial_cmp(&merged[a].crowding)
                .unwrap_or(Ordering::Equal)
        });
        keep.extend(front.into_iter().take(n - keep.len()));
        break;
    }

    let mut survivors: Vec<Individual> = keep.into_iter().map(|i| merged[i].clone()).collect();
    rank_and_crowd(&mut survivors);
    survivors
}

fn snapshot(population: &[Individual]) -> Snapshot {
    let optimal = optimal_set(population);
    Snapshot {
        x: optimal.iter().map(|i| i.x.clone()).collect(),
        f: optimal.iter().map(|i| i.f.clone()).collect(),
        min_cv: population.iter().map(|i| i.cv).fold(f64::INFINITY, f64::min),
        feasible: population.iter().any(Individual::is_feasible),
    }
}

/// Non-dominated feasible individuals, or the least-violating one
fn optimal_set(population: &[Individual]) -> Vec<&Individual> {
    let feasible: Vec<&Individual> = population.iter().filter(|i| i.is_feasible()).collect();
    if feasible.is_empty() {
        return population
            .iter()
            .min_by(|a, b| a.cv.partial_cmp(&b.cv).unwrap_or(Ordering::Equal))
            .into_iter()
            .collect();
    }
    let f: Vec<Vec<f64>> = feasible.iter().map(|i| i.f.clone()).collect();
    match non_dominated_fronts(&f).into_iter().next() {
        Some(front) => front.into_iter().map(|k| feasible[k]).collect(),
        None => Vec::new(),
    }
}

fn result(population: &[Individual], generations: usize, evaluations: usize, stop_reason: StopReason) -> OptimizationResult {
    let optimal = optimal_set(population);
    OptimizationResult {
        x: optimal.iter().map(|i| i.x.clone()).collect(),
        f: optimal.iter().map(|i| i.f.clone()).collect(),
        g: optimal.iter().map(|i| i.g.clone()).collect(),
        generations,
        evaluations,
        stop_reason,
    }
}
