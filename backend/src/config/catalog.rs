//! Built-in run catalog
//!
//! Families:
//!
//! - `base_case_no_control*`: no decision variables, one generation
//! - `romer*`: testing policy only
//! - `base_case_lockdown_opt*`, `base_case_*_incubation`: lockdown only
//! - `test_and_trace_lockdown_opt*`: lockdown only, with contact tracing
//! - `combo_*`: lockdown and testing together
//!
//! Extra runs can be loaded from a JSON object mapping run names to
//! [`RunOverrides`]; a loaded run replaces a built-in one of the same name.

use super::run::{ControlDaysOverride, RunConfig, RunOverrides, DEFAULT_CONTROL_DAYS};
use super::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

/// Tests per day when the daily cap is effectively lifted
const UNLIMITED_DAILY_TESTS: f64 = 340_000_000.0;

fn shifted_days(first: &[u32]) -> Vec<u32> {
    let mut days = first.to_vec();
    days.extend(DEFAULT_CONTROL_DAYS.iter().skip(first.len()));
    days
}

fn no_control() -> RunOverrides {
    RunOverrides {
        lockdown_policy_control_days: Some(ControlDaysOverride::absent()),
        testing_policy_control_days: Some(ControlDaysOverride::absent()),
        max_generations: Some(1),
        ..Default::default()
    }
}

fn testing_only() -> RunOverrides {
    RunOverrides {
        lockdown_policy_control_days: Some(ControlDaysOverride::absent()),
        ..Default::default()
    }
}

fn lockdown_only() -> RunOverrides {
    RunOverrides {
        testing_policy_control_days: Some(ControlDaysOverride::absent()),
        ..Default::default()
    }
}

fn test_and_trace(eta: f64) -> RunOverrides {
    RunOverrides {
        trace_efficiency: Some(eta),
        trace_testing_rate: Some(0.5),
        unknown_exit_rate: Some(0.01),
        max_daily_tests: Some(UNLIMITED_DAILY_TESTS),
        ..lockdown_only()
    }
}

fn sens_spec(base: RunOverrides, sens: Option<f64>, spec: Option<f64>) -> RunOverrides {
    RunOverrides {
        test_sensitivity: sens.or(base.test_sensitivity),
        test_specificity: spec.or(base.test_specificity),
        ..base
    }
}

/// All built-in runs, by name
pub fn catalog() -> BTreeMap<String, RunOverrides> {
    let mut runs = BTreeMap::new();

    push(&mut runs, "base_case_no_control", no_control());
    push(
        &mut runs,
        "base_case_no_control_R0_4.0",
        RunOverrides {
            r0: Some(4.0),
            ..no_control()
        },
    );

    // Testing only
    push(&mut runs, "romer", testing_only());
    push(
        &mut runs,
        "romer_no_limit",
        RunOverrides {
            testing_policy_upper_limits: Some(vec![0.05; DEFAULT_CONTROL_DAYS.len()]),
            max_daily_tests: Some(UNLIMITED_DAILY_TESTS),
            ..testing_only()
        },
    );
    for (name, years) in [("romer_terminal_0.25", 0.25), ("romer_terminal_1.0", 1.0)] {
        push(
            &mut runs,
            name,
            RunOverrides {
                recovery_years: Some(years),
                ..testing_only()
            },
        );
    }
    let romer_r0_4 = RunOverrides {
        r0: Some(4.0),
        ..testing_only()
    };
    push(&mut runs, "romer_R0_4.0", romer_r0_4.clone());
    push(
        &mut runs,
        "romer_R0_4.0_no_limit",
        RunOverrides {
            max_daily_tests: Some(UNLIMITED_DAILY_TESTS),
            ..romer_r0_4.clone()
        },
    );
    push(
        &mut runs,
        "romer_R0_1.25",
        RunOverrides {
            r0: Some(1.25),
            ..testing_only()
        },
    );
    for (name, p) in [
        ("romer_R0_4.0_sens_spec_075", 0.75),
        ("romer_R0_4.0_sens_spec_085", 0.85),
        ("romer_R0_4.0_sens_spec_090", 0.90),
        ("romer_R0_4.0_sens_spec_095", 0.95),
    ] {
        push(&mut runs, name, sens_spec(romer_r0_4.clone(), Some(p), Some(p)));
    }

    for days in [6.0, 8.0] {
        let base = RunOverrides {
            days_to_symptoms: Some(days),
            ..testing_only()
        };
        let prefix = format!("romer_{}d_incubation", days as u32);
        push(&mut runs, prefix.clone(), base.clone());
        let variants: &[f64] = if days == 6.0 { &[0.90] } else { &[0.75, 0.90] };
        for p in variants {
            let name = format!("{}_sens_spec_{:03}", prefix, (p * 100.0).round() as u32);
            push(&mut runs, name, sens_spec(base.clone(), Some(*p), Some(*p)));
        }
    }

    for (name, first) in [
        ("romer_3d_delay", &[3u32][..]),
        ("romer_7d_delay", &[7u32][..]),
        ("romer_14d_delay", &[14u32][..]),
        ("romer_28d_delay", &[28u32, 29][..]),
    ] {
        push(
            &mut runs,
            name,
            RunOverrides {
                testing_policy_control_days: Some(ControlDaysOverride::Days(shifted_days(first))),
                ..testing_only()
            },
        );
    }

    push(&mut runs, "romer_sens_085", sens_spec(testing_only(), Some(0.85), None));
    push(&mut runs, "romer_spec_085", sens_spec(testing_only(), None, Some(0.85)));
    for (name, p) in [
        ("romer_sens_spec_085", 0.85),
        ("romer_sens_spec_090", 0.90),
        ("romer_sens_spec_095", 0.95),
        ("romer_sens_spec_098", 0.98),
        ("romer_sens_spec_099", 0.99),
    ] {
        push(&mut runs, name, sens_spec(testing_only(), Some(p), Some(p)));
    }

    // Lockdown only
    push(&mut runs, "base_case_lockdown_opt", lockdown_only());
    for (name, years) in [
        ("base_case_lockdown_opt_terminal_0.25", 0.25),
        ("base_case_lockdown_opt_terminal_1.0", 1.0),
    ] {
        push(
            &mut runs,
            name,
            RunOverrides {
                recovery_years: Some(years),
                ..lockdown_only()
            },
        );
    }
    push(
        &mut runs,
        "base_case_lockdown_opt_R0_4.0",
        RunOverrides {
            r0: Some(4.0),
            ..lockdown_only()
        },
    );

    let limited_testing = RunOverrides {
        testing_rate: Some(0.01),
        ..lockdown_only()
    };
    push(
        &mut runs,
        "base_case_lockdown_opt_with_limited_general_testing",
        limited_testing.clone(),
    );
    for (name, sens, spec) in [
        ("base_case_lockdown_opt_with_limited_imperfect(0.75)_general_testing", Some(0.75), Some(0.75)),
        ("base_case_lockdown_opt_with_limited_sens075_general_testing", Some(0.75), None),
        ("base_case_lockdown_opt_with_limited_spec075_general_testing", None, Some(0.75)),
        ("base_case_lockdown_opt_with_limited_sens090_general_testing", Some(0.90), None),
        ("base_case_lockdown_opt_with_limited_spec090_general_testing", None, Some(0.90)),
        ("base_case_lockdown_opt_with_limited_imperfect(0.85)_general_testing", Some(0.85), Some(0.85)),
        ("base_case_lockdown_opt_with_limited_imperfect(0.90)_general_testing", Some(0.90), Some(0.90)),
        ("base_case_lockdown_opt_with_limited_imperfect(0.95)_general_testing", Some(0.95), Some(0.95)),
    ] {
        push(&mut runs, name, sens_spec(limited_testing.clone(), sens, spec));
    }

    for (name, first) in [
        ("base_case_lockdown_opt_3d_delay", &[3u32][..]),
        ("base_case_lockdown_opt_7d_delay", &[7u32][..]),
        ("base_case_lockdown_opt_14d_delay", &[14u32][..]),
        ("base_case_lockdown_opt_28d_delay", &[28u32, 29][..]),
    ] {
        push(
            &mut runs,
            name,
            RunOverrides {
                lockdown_policy_control_days: Some(ControlDaysOverride::Days(shifted_days(first))),
                ..lockdown_only()
            },
        );
    }
    for (name, days) in [("base_case_6d_incubation", 6.0), ("base_case_8d_incubation", 8.0)] {
        push(
            &mut runs,
            name,
            RunOverrides {
                days_to_symptoms: Some(days),
                ..lockdown_only()
            },
        );
    }

    // Test and trace
    for (name, eta) in [
        // Efficiency follows the run name. Earlier run tables listed 0.50
        // here, duplicating eta50.
        ("test_and_trace_lockdown_opt_eta10", 0.10),
        ("test_and_trace_lockdown_opt_eta50", 0.50),
        ("test_and_trace_lockdown_opt_eta75", 0.75),
        ("test_and_trace_lockdown_opt_eta95", 0.95),
        ("test_and_trace_lockdown_opt_eta100", 1.00),
    ] {
        push(&mut runs, name, test_and_trace(eta));
    }
    for (suffix, eta) in [("eta50", 0.50), ("eta75", 0.75), ("eta100", 1.00)] {
        let r04 = RunOverrides {
            r0: Some(4.0),
            ..test_and_trace(eta)
        };
        push(
            &mut runs,
            format!("test_and_trace_lockdown_opt_{}_R04", suffix),
            r04.clone(),
        );
        push(
            &mut runs,
            format!("test_and_trace_lockdown_opt_{}_R04_delta10", suffix),
            RunOverrides {
                days_to_symptoms: Some(10.0),
                ..r04
            },
        );
    }

    // Lockdown and testing together
    push(&mut runs, "combo_base_case", RunOverrides::default());
    push(
        &mut runs,
        "combo_base_case_R0_4.0",
        RunOverrides {
            r0: Some(4.0),
            ..Default::default()
        },
    );
    push(
        &mut runs,
        "combo_base_case_test_and_trace",
        RunOverrides {
            trace_efficiency: Some(1.0),
            trace_testing_rate: Some(0.5),
            unknown_exit_rate: Some(0.01),
            days_to_symptoms: Some(10.0),
            ..Default::default()
        },
    );
    for (name, r0, p) in [
        ("combo_sens_spec_0.95", None, 0.95),
        ("combo_sens_spec_0.85", None, 0.85),
        ("combo_R0_4.0_sens_spec_0.95", Some(4.0), 0.95),
        ("combo_R0_4.0_sens_spec_0.85", Some(4.0), 0.85),
    ] {
        let base = RunOverrides {
            r0,
            ..Default::default()
        };
        push(&mut runs, name, sens_spec(base, Some(p), Some(p)));
    }

    runs
}

fn push(runs: &mut BTreeMap<String, RunOverrides>, name: impl Into<String>, overrides: RunOverrides) {
    runs.insert(name.into(), overrides);
}

/// Parse a JSON object of run name → overrides
pub fn parse_runs(json: &str) -> Result<BTreeMap<String, RunOverrides>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Load extra run definitions from a JSON file
pub fn load_runs_file(path: &Path) -> Result<BTreeMap<String, RunOverrides>, ConfigError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
    parse_runs(&json)
}

/// Resolve `name` against `extra` first, then the built-in catalog
pub fn resolve_run(
    name: &str,
    extra: &BTreeMap<String, RunOverrides>,
) -> Result<RunConfig, ConfigError> {
    let overrides = match extra.get(name) {
        Some(overrides) => overrides.clone(),
        None => catalog()
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownRun(name.to_string()))?,
    };
    RunConfig::default().with_overrides(&overrides)
}
