//! Result persistence
//!
//! Per run, into one output directory:
//!
//! - `<run>_results.csv`: decision vectors, one column per control day
//! - `<run>_objectives.csv`: `Deaths,Economic impact,Peak Symptomatics`
//! - `<run>_constraints.csv`: `Max daily tests marginal`
//! - `<run>_config.json`: resolved run configuration and its fingerprint

use crate::config::{config_hash, ConfigError, RunConfig};
use crate::objective::Evaluation;
use crate::optimizer::{OptimizationResult, StopReason};
use crate::problem::DecisionLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Sidecar written next to the CSV files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run: String,
    pub config_hash: String,
    pub generations: usize,
    pub evaluations: usize,
    pub stop_reason: StopReason,
    pub config: RunConfig,
}

/// Paths written for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunArtifacts {
    pub results: PathBuf,
    pub objectives: PathBuf,
    pub constraints: PathBuf,
    pub manifest: PathBuf,
}

pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    /// Writer into `dir`, created if missing
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(
        &self,
        run: &str,
        config: &RunConfig,
        layout: &DecisionLayout,
        result: &OptimizationResult,
    ) -> Result<RunArtifacts, ResultsError> {
        let artifacts = RunArtifacts {
            results: self.dir.join(format!("{}_results.csv", run)),
            objectives: self.dir.join(format!("{}_objectives.csv", run)),
            constraints: self.dir.join(format!("{}_constraints.csv", run)),
            manifest: self.dir.join(format!("{}_config.json", run)),
        };

        let labels = layout.column_labels();
        if labels.is_empty() {
            // Nothing was optimized; there are no decision columns
            fs::write(&artifacts.results, "")?;
        } else {
            write_table(&artifacts.results, labels.as_slice(), &result.x)?;
        }
        write_table(&artifacts.objectives, &Evaluation::OBJECTIVE_LABELS, &result.f)?;
        write_table(&artifacts.constraints, &[Evaluation::CONSTRAINT_LABEL], &result.g)?;

        let manifest = RunManifest {
            run: run.to_string(),
            config_hash: config_hash(config)?,
            generations: result.generations,
            evaluations: result.evaluations,
            stop_reason: result.stop_reason,
            config: config.clone(),
        };
        fs::write(&artifacts.manifest, serde_json::to_string_pretty(&manifest)?)?;

        info!(
            run,
            rows = result.x.len(),
            dir = %self.dir.display(),
            "Results written"
        );
        Ok(artifacts)
    }
}

fn write_table<S: AsRef<str>>(path: &Path, header: &[S], rows: &[Vec<f64>]) -> Result<(), ResultsError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
