//! Configuration
//!
//! All configuration is typed, immutable and validated when it is built:
//!
//! - **params**: fixed biological and economic parameters ([`EpidemicParams`])
//! - **scenario**: per-scenario testing and quarantine rates
//! - **run**: one optimization run ([`RunConfig`]) and its overrides
//! - **catalog**: the built-in named runs

pub mod catalog;
pub mod params;
pub mod run;
pub mod scenario;

pub use catalog::{catalog, load_runs_file, resolve_run};
pub use params::{DerivedRates, EpidemicParams};
pub use run::{RunConfig, RunOverrides};
pub use scenario::{
    DailyScenarioRates, ExperimentStart, QuarantineExitRates, QuarantineRates, ScenarioParams,
};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("{policy} bounds: {days} control days but {lower} lower and {upper} upper limits")]
    BoundsMismatch {
        policy: &'static str,
        days: usize,
        lower: usize,
        upper: usize,
    },

    #[error("Unknown run: {0}")]
    UnknownRun(String),

    #[error("Failed to parse run definitions: {0}")]
    Parse(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Deterministic SHA-256 of a configuration
///
/// Object keys are sorted recursively before hashing, so the result does
/// not depend on field or map order.
pub fn config_hash<T: Serialize>(config: &T) -> Result<String, ConfigError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| ConfigError::Serialization(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| ConfigError::Serialization(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_hash_deterministic() {
        let a = config_hash(&RunConfig::default()).unwrap();
        let b = config_hash(&RunConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_config_hash_sees_every_field() {
        let base = RunConfig::default();
        let mut changed = base.clone();
        changed.evaluator.icu_fraction = 0.02;
        assert_ne!(config_hash(&base).unwrap(), config_hash(&changed).unwrap());
    }
}
