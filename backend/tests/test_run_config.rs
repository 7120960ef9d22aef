//! Run definitions: catalog, override files, fingerprints

use epidemic_policy_core_rs::config::{
    catalog, config_hash, load_runs_file, resolve_run, ConfigError,
};
use epidemic_policy_core_rs::{Problem, RunConfig, RunOverrides};
use std::collections::BTreeMap;
use std::fs;

#[test]
fn test_catalog_covers_study_families() {
    let runs = catalog();
    for name in [
        "base_case_no_control",
        "romer",
        "romer_R0_4.0_sens_spec_090",
        "base_case_lockdown_opt",
        "base_case_lockdown_opt_with_limited_imperfect(0.85)_general_testing",
        "test_and_trace_lockdown_opt_eta50_R04_delta10",
        "combo_base_case",
        "combo_R0_4.0_sens_spec_0.85",
    ] {
        assert!(runs.contains_key(name), "missing run {}", name);
    }
}

#[test]
fn test_romer_optimizes_testing_only() {
    let cfg = resolve_run("romer", &BTreeMap::new()).unwrap();
    assert!(cfg.lockdown.days.is_absent());
    assert_eq!(cfg.testing.days.len(), 15);
    assert_eq!(cfg.max_generations, None);
}

#[test]
fn test_limited_testing_sets_daily_rate() {
    let cfg = resolve_run(
        "base_case_lockdown_opt_with_limited_sens075_general_testing",
        &BTreeMap::new(),
    )
    .unwrap();
    assert_eq!(cfg.scenario.testing_rate, 0.01);
    assert_eq!(cfg.scenario.test_sensitivity, 0.75);
    assert_eq!(cfg.scenario.test_specificity, 1.0);
    assert!(cfg.testing.days.is_absent());
}

#[test]
fn test_runs_file_adds_and_shadows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.json");
    fs::write(
        &path,
        r#"{
            "short_romer": {
                "lockdown_policy_control_days": "NA",
                "horizon_days": 20,
                "n_gen": 2
            },
            "romer": { "R_0": 3.0 }
        }"#,
    )
    .unwrap();

    let extra = load_runs_file(&path).unwrap();
    assert_eq!(extra.len(), 2);

    let short = resolve_run("short_romer", &extra).unwrap();
    assert_eq!(short.epidemic.horizon_days, 20);
    assert_eq!(short.generation_cap(100), 2);

    let romer = resolve_run("romer", &extra).unwrap();
    assert_eq!(romer.epidemic.r0, 3.0);
    // Shadowed entirely, so lockdown is back to its defaults
    assert!(!romer.lockdown.days.is_absent());
}

#[test]
fn test_runs_file_with_unknown_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.json");
    fs::write(&path, r#"{"bad": {"R_zero": 3.0}}"#).unwrap();
    assert!(matches!(load_runs_file(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_runs_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_runs_file(&dir.path().join("absent.json")),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_unknown_run_name() {
    assert!(matches!(
        resolve_run("romer_typo", &BTreeMap::new()),
        Err(ConfigError::UnknownRun(name)) if name == "romer_typo"
    ));
}

#[test]
fn test_out_of_range_override_rejected() {
    let overrides = RunOverrides {
        test_sensitivity: Some(1.2),
        ..Default::default()
    };
    assert!(RunConfig::default().with_overrides(&overrides).is_err());
}

#[test]
fn test_repeated_control_day_override_rejected() {
    let overrides: RunOverrides = serde_json::from_str(
        r#"{
            "lockdown_policy_control_days": [1, 15, 15],
            "lockdown_policy_lower_limits": [0.5, 0.5, 0.5],
            "lockdown_policy_upper_limits": [1.0, 1.0, 1.0]
        }"#,
    )
    .unwrap();
    assert!(matches!(
        RunConfig::default().with_overrides(&overrides),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_hash_tracks_effective_configuration() {
    let base = RunConfig::default();
    let same = base.with_overrides(&RunOverrides::default()).unwrap();
    assert_eq!(config_hash(&base).unwrap(), config_hash(&same).unwrap());

    let changed = base
        .with_overrides(&RunOverrides {
            r0: Some(4.0),
            ..Default::default()
        })
        .unwrap();
    assert_ne!(config_hash(&base).unwrap(), config_hash(&changed).unwrap());
}

#[test]
fn test_build_problem_from_run() {
    let cfg = RunConfig::default()
        .with_overrides(&RunOverrides {
            horizon_days: Some(20),
            ..Default::default()
        })
        .unwrap();
    let problem = cfg.build_problem().unwrap();

    assert_eq!(problem.n_var(), 30);
    let (lower, upper) = problem.bounds();
    assert_eq!(lower[0], 0.5);
    assert_eq!(upper[0], 1.0);
    assert_eq!(lower[15], 0.0);
    assert_eq!(upper[15], 0.02);
}
