//! Result files written for a complete run

use epidemic_policy_core_rs::config::run::ControlDaysOverride;
use epidemic_policy_core_rs::config::{config_hash, resolve_run};
use epidemic_policy_core_rs::results::RunManifest;
use epidemic_policy_core_rs::{Nsga2, ResultWriter, RunOverrides};
use std::collections::BTreeMap;
use std::fs;

fn short_run(name: &str, overrides: RunOverrides) -> BTreeMap<String, RunOverrides> {
    let mut runs = BTreeMap::new();
    runs.insert(
        name.to_string(),
        RunOverrides {
            horizon_days: Some(20),
            pop_size: Some(6),
            n_offsprings: Some(3),
            ..overrides
        },
    );
    runs
}

fn read_table(path: &std::path::Path) -> (Vec<String>, Vec<Vec<f64>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(|v| v.parse::<f64>().unwrap()).collect())
        .collect();
    (header, rows)
}

#[test]
fn test_full_run_writes_consistent_tables() {
    let extra = short_run(
        "tiny_lockdown",
        RunOverrides {
            testing_policy_control_days: Some(ControlDaysOverride::absent()),
            lockdown_policy_control_days: Some(ControlDaysOverride::Days(vec![1, 10])),
            lockdown_policy_lower_limits: Some(vec![0.5, 0.5]),
            lockdown_policy_upper_limits: Some(vec![1.0, 1.0]),
            ..Default::default()
        },
    );
    let cfg = resolve_run("tiny_lockdown", &extra).unwrap();
    let problem = cfg.build_problem().unwrap();

    let mut optimizer = cfg.optimizer.clone();
    optimizer.termination.max_generations = cfg.generation_cap(2);
    let result = Nsga2::new(optimizer, 3).unwrap().minimize(&problem).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let writer = ResultWriter::new(dir.path()).unwrap();
    let paths = writer
        .write("tiny_lockdown", &cfg, problem.layout(), &result)
        .unwrap();

    let (x_header, xs) = read_table(&paths.results);
    assert_eq!(x_header, vec!["1", "10"]);
    let (f_header, fs_rows) = read_table(&paths.objectives);
    assert_eq!(f_header, vec!["Deaths", "Economic impact", "Peak Symptomatics"]);
    let (g_header, gs) = read_table(&paths.constraints);
    assert_eq!(g_header, vec!["Max daily tests marginal"]);

    assert_eq!(xs.len(), result.x.len());
    assert_eq!(fs_rows.len(), xs.len());
    assert_eq!(gs.len(), xs.len());
    assert_eq!(fs_rows, result.f);

    let manifest: RunManifest =
        serde_json::from_str(&fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest.run, "tiny_lockdown");
    assert_eq!(manifest.config_hash, config_hash(&cfg).unwrap());
    assert_eq!(manifest.generations, 2);
}

#[test]
fn test_no_control_run_writes_single_row() {
    let extra = short_run(
        "tiny_no_control",
        RunOverrides {
            lockdown_policy_control_days: Some(ControlDaysOverride::absent()),
            testing_policy_control_days: Some(ControlDaysOverride::absent()),
            max_generations: Some(1),
            ..Default::default()
        },
    );
    let cfg = resolve_run("tiny_no_control", &extra).unwrap();
    let problem = cfg.build_problem().unwrap();
    let result = Nsga2::new(cfg.optimizer.clone(), 1)
        .unwrap()
        .minimize(&problem)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let writer = ResultWriter::new(dir.path().join("nested")).unwrap();
    let paths = writer
        .write("tiny_no_control", &cfg, problem.layout(), &result)
        .unwrap();

    assert_eq!(fs::read_to_string(&paths.results).unwrap(), "");
    let (_, objectives) = read_table(&paths.objectives);
    assert_eq!(objectives.len(), 1);
    assert!(objectives[0].iter().all(|v| v.is_finite()));
}
