//! Epidemic Policy Core - Rust Engine
//!
//! Discrete-time compartmental epidemic simulator with multi-objective
//! optimization of lockdown and testing schedules.
//!
//! # Architecture
//!
//! - **core**: Time grid and numeric helpers
//! - **schedule**: Piecewise-constant policy schedules
//! - **models**: Compartments and transition matrices
//! - **config**: Epidemic parameters, scenarios, run definitions
//! - **engine**: Step-by-step Markov simulation
//! - **objective**: Trajectory reduction to objectives and constraint
//! - **problem**: Decision-vector layout and batch evaluation
//! - **optimizer**: NSGA-II search
//! - **results**: CSV and manifest output
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Total population mass is conserved at every step
//! 2. Every transition matrix is row-stochastic, or the run fails loudly
//! 3. All randomness is deterministic (seeded RNG)

// Module declarations
pub mod config;
pub mod core;
pub mod engine;
pub mod models;
pub mod objective;
pub mod optimizer;
pub mod problem;
pub mod results;
pub mod rng;
pub mod schedule;

// Re-exports for convenience
pub use config::{
    ConfigError, DailyScenarioRates, EpidemicParams, ExperimentStart, RunConfig, RunOverrides,
    ScenarioParams,
};
pub use core::time::TimeGrid;
pub use engine::{EpidemicModel, SimulationError, StepObserver, Trajectories};
pub use models::{Compartment, CompartmentVector, TransitionMatrix};
pub use objective::{Evaluation, EvaluationError, EvaluatorConfig, ObjectiveEvaluator};
pub use optimizer::{Nsga2, OptimizationResult, OptimizerConfig, StopReason};
pub use problem::{DecisionLayout, PolicyControls, PolicyProblem, Problem};
pub use results::{ResultWriter, ResultsError};
pub use rng::RngManager;
pub use schedule::{ControlDays, Policy, Schedule};
