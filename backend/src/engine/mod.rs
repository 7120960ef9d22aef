//! Simulation engine
//!
//! - **rates**: phase selection, contact mix, test-and-trace rates
//! - **model**: [`EpidemicModel`], the step loop
//! - **trajectory**: daily aggregation into [`Trajectories`]

pub mod model;
pub mod rates;
pub mod trajectory;

pub use model::{EpidemicModel, StepObserver};
pub use rates::{ActiveRates, ContactMix, Phase, TraceRates};
pub use trajectory::{StepRecord, Trajectories, TrajectoryRecorder};

use crate::config::ConfigError;
use crate::models::{MatrixViolation, TransitionMatrix};
use thiserror::Error;

/// Engine errors
///
/// Both variants are structural: they come from the parameterization, not
/// from any particular policy, and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A transition matrix left the stochastic tolerance
    #[error("Invalid transition matrix at step {step}: {violation}")]
    InvalidTransitionMatrix {
        step: usize,
        violation: MatrixViolation,
        matrix: Box<TransitionMatrix>,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}
