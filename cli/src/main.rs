//! Epidemic policy optimizer
//!
//! Runs NSGA-II over lockdown and testing schedules for one or more named
//! runs and writes the resulting Pareto sets as CSV.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epidemic_policy_core_rs::config::{catalog, load_runs_file, resolve_run};
use epidemic_policy_core_rs::{Nsga2, ResultWriter, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "epidemic-opt")]
#[command(version)]
#[command(about = "Multi-objective optimization of epidemic lockdown and testing policies")]
struct Args {
    /// Maximum number of generations per run
    #[arg(required_unless_present = "list")]
    max_gen: Option<usize>,

    /// Run names, from the built-in catalog or --runs-file
    #[arg(required_unless_present = "list")]
    runs: Vec<String>,

    /// Directory for result files
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// JSON file of extra run definitions (name -> overrides)
    #[arg(long)]
    runs_file: Option<PathBuf>,

    /// Optimizer seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Print the available run names and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let extra = match &args.runs_file {
        Some(path) => load_runs_file(path)
            .with_context(|| format!("Failed to load run definitions from {}", path.display()))?,
        None => BTreeMap::new(),
    };

    if args.list {
        let mut names: Vec<String> = catalog().into_keys().collect();
        names.extend(extra.keys().cloned());
        names.sort();
        names.dedup();
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }

    let max_gen = args.max_gen.context("max_gen is required")?;

    // Unknown run names abort before any optimization starts
    let runs: Vec<(String, RunConfig)> = args
        .runs
        .iter()
        .map(|name| {
            resolve_run(name, &extra)
                .map(|cfg| (name.clone(), cfg))
                .with_context(|| format!("Failed to resolve run '{}'", name))
        })
        .collect::<Result<_>>()?;

    let writer = ResultWriter::new(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    info!(runs = runs.len(), max_gen, seed = args.seed, "Starting optimization");

    for (name, cfg) in &runs {
        info!(run = %name, "Building problem");
        let problem = cfg
            .build_problem()
            .with_context(|| format!("Failed to build problem for run '{}'", name))?;

        let mut optimizer_config = cfg.optimizer.clone();
        optimizer_config.termination.max_generations = cfg.generation_cap(max_gen);
        let optimizer = Nsga2::new(optimizer_config, args.seed)
            .with_context(|| format!("Invalid optimizer configuration for run '{}'", name))?;

        let result = optimizer
            .minimize(&problem)
            .with_context(|| format!("Optimization failed for run '{}'", name))?;

        info!(
            run = %name,
            generations = result.generations,
            evaluations = result.evaluations,
            pareto_size = result.x.len(),
            stop_reason = ?result.stop_reason,
            "Run finished"
        );

        writer
            .write(name, cfg, problem.layout(), &result)
            .with_context(|| format!("Failed to write results for run '{}'", name))?;
    }

    info!(dir = %writer.dir().display(), "All runs complete");
    Ok(())
}
