//! Deterministic random number generation
//!
//! The simulation itself is deterministic; only the optimizer draws random
//! numbers, and all of them go through this module.

mod xorshift;

pub use xorshift::RngManager;
