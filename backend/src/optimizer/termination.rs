//! Termination criteria
//!
//! Hard caps on generations and evaluations, plus a sliding-window
//! convergence check. Every `nth_gen` generations the changes recorded over
//! the last `n_last` generations are compared against tolerances:
//!
//! - constraint violation (while no feasible point exists): `cv_tol`
//! - decision space (movement of the optimal set): `x_tol`
//! - objective space (normalized movement of the front): `f_tol`
//!
//! Any one criterion being met stops the search.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    pub x_tol: f64,
    pub cv_tol: f64,
    pub f_tol: f64,
    pub nth_gen: usize,
    pub n_last: usize,
    pub max_generations: usize,
    pub max_evaluations: usize,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            x_tol: 1e-8,
            cv_tol: 1e-6,
            f_tol: 0.0025,
            nth_gen: 5,
            n_last: 30,
            max_generations: 1000,
            max_evaluations: 100_000,
        }
    }
}

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxGenerations,
    MaxEvaluations,
    ConstraintTolerance,
    DesignTolerance,
    ObjectiveTolerance,
    /// No decision variables: the single point was evaluated once
    NoVariables,
}

/// Optimal set of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub x: Vec<Vec<f64>>,
    pub f: Vec<Vec<f64>>,
    /// Smallest total constraint violation in the population
    pub min_cv: f64,
    pub feasible: bool,
}

#[derive(Debug, Clone, Copy)]
struct Delta {
    x: f64,
    f: f64,
    cv: f64,
}

/// Stateful termination check, fed one snapshot per generation
#[derive(Debug)]
pub struct Termination {
    config: TerminationConfig,
    previous: Option<Snapshot>,
    deltas: VecDeque<Delta>,
}

impl Termination {
    pub fn new(config: TerminationConfig) -> Self {
        Self {
            config,
            previous: None,
            deltas: VecDeque::new(),
        }
    }

    /// Record generation `generation` (1-based) and decide whether to stop
    pub fn update(&mut self, generation: usize, evaluations: usize, snapshot: Snapshot) -> Option<StopReason> {
        if let Some(prev) = self.previous.take() {
            let delta = Delta {
                x: set_distance(&snapshot.x, &prev.x),
                f: normalized_front_distance(&snapshot.f, &prev.f),
                cv: (snapshot.min_cv - prev.min_cv).abs(),
            };
            if self.deltas.len() == self.config.n_last.max(1) {
                self.deltas.pop_front();
            }
            self.deltas.push_back(delta);
        }
        let feasible = snapshot.feasible;
        self.previous = Some(snapshot);

        if generation >= self.config.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        if evaluations >= self.config.max_evaluations {
            return Some(StopReason::MaxEvaluations);
        }

        let window_full = self.deltas.len() >= self.config.n_last.max(1);
        if !window_full || generation % self.config.nth_gen.max(1) != 0 {
            return None;
        }
        let max_of = |pick: fn(&Delta) -> f64| self.deltas.iter().map(pick).fold(0.0, f64::max);

        if !feasible {
            if max_of(|d| d.cv) <= self.config.cv_tol {
                return Some(StopReason::ConstraintTolerance);
            }
            return None;
        }
        if max_of(|d| d.x) <= self.config.x_tol {
            return Some(StopReason::DesignTolerance);
        }
        if max_of(|d| d.f) <= self.config.f_tol {
            return Some(StopReason::ObjectiveTolerance);
        }
        None
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Mean distance from each point of `to` to its nearest point in `from`
fn set_distance(from: &[Vec<f64>], to: &[Vec<f64>]) -> f64 {
    if from.is_empty() || to.is_empty() {
        return f64::INFINITY;
    }
    let total: f64 = to
        .iter()
        .map(|p| from.iter().map(|q| euclidean(p, q)).fold(f64::INFINITY, f64::min))
        .sum();
    total / to.len() as f64
}

/// Set distance after scaling objectives by the current front's range
fn normalized_front_distance(current: &[Vec<f64>], previous: &[Vec<f64>]) -> f64 {
    let Some(first) = current.first() else {
        return f64::INFINITY;
    };
    let n_obj = first.len();
    let mut ideal = vec![f64::INFINITY; n_obj];
    let mut nadir = vec![f64::NEG_INFINITY; n_obj];
    for point in current {
        for m in 0..n_obj {
            ideal[m] = ideal[m].min(point[m]);
            nadir[m] = nadir[m].max(point[m]);
        }
    }
    let scale = |point: &Vec<f64>| -> Vec<f64> {
        (0..n_obj)
            .map(|m| {
                let span = nadir[m] - ideal[m];
                if span > 0.0 && span.is_finite() {
                    (point[m] - ideal[m]) / span
                } else {
                    point[m] - ideal[m]
                }
            })
            .collect()
    };
    let current: Vec<Vec<f64>> = current.iter().map(scale).collect();
    let previous: Vec<Vec<f64>> = previous.iter().map(scale).collect();
    set_distance(&current, &previous)
}
