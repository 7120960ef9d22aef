//! Domain models for the epidemic engine

pub mod compartment;
pub mod transition;

// Re-exports
pub use compartment::{groups, Compartment, CompartmentVector, NUM_COMPARTMENTS};
pub use transition::{MatrixViolation, TransitionMatrix, ViolationKind, STOCHASTIC_TOLERANCE};
