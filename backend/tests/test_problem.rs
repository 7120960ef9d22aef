//! Decision-vector decoding and batch evaluation

use epidemic_policy_core_rs::problem::DecodeError;
use epidemic_policy_core_rs::ConfigError;
use epidemic_policy_core_rs::{
    ControlDays, DecisionLayout, EpidemicModel, EpidemicParams, EvaluationError, EvaluatorConfig,
    ExperimentStart, PolicyControls, PolicyProblem, Problem, ScenarioParams, SimulationError,
};

fn model() -> EpidemicModel {
    EpidemicModel::new(EpidemicParams {
        horizon_days: 25,
        ..Default::default()
    })
    .unwrap()
}

fn lockdown_problem(scenario: &ScenarioParams) -> PolicyProblem {
    PolicyProblem::new(
        model(),
        scenario,
        &PolicyControls::uniform(vec![1, 10, 20], 0.5, 1.0),
        &PolicyControls::absent(),
        EvaluatorConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_decode_lockdown_only() {
    let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15, 30]), ControlDays::Absent);
    let policy = layout.decode(&[0.9, 0.7, 0.8]).unwrap();

    assert!(policy.testing.is_absent());
    assert_eq!(policy.lockdown.value_at(13, 1.0), 1.0);
    assert_eq!(policy.lockdown.value_at(14, 1.0), 0.9);
    assert_eq!(policy.lockdown.value_at(15 * 14, 1.0), 0.7);
    assert_eq!(policy.lockdown.value_at(30 * 14, 1.0), 0.8);
}

#[test]
fn test_decode_splits_lockdown_then_testing() {
    let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15]), ControlDays::Days(vec![5]));
    assert_eq!(layout.n_var(), 3);
    assert_eq!(layout.column_labels(), vec!["1", "15", "5"]);

    let policy = layout.decode(&[0.6, 0.9, 0.01]).unwrap();
    assert_eq!(policy.lockdown.len(), 2);
    assert_eq!(policy.testing.value_at(5 * 14, 0.0), 0.01);
}

#[test]
fn test_decode_rejects_wrong_length() {
    let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15, 30]), ControlDays::Absent);
    assert_eq!(
        layout.decode(&[0.9, 0.7]),
        Err(DecodeError::LengthMismatch {
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn test_batch_preserves_input_order() {
    let problem = lockdown_problem(&ScenarioParams::baseline());
    let xs = vec![
        vec![1.0, 1.0, 1.0],
        vec![0.5, 0.5, 0.5],
        vec![0.8, 0.6, 1.0],
    ];

    let batch = problem.evaluate(&xs).unwrap();
    assert_eq!(batch.len(), 3);
    for (x, f) in xs.iter().zip(&batch.f) {
        let single = problem.evaluator().evaluate(x).unwrap();
        assert_eq!(f, &single.objectives().to_vec());
    }
    // Harder lockdown costs more output
    assert!(batch.f[1][1] > batch.f[0][1]);
}

#[test]
fn test_malformed_individual_scored_infinite() {
    let problem = lockdown_problem(&ScenarioParams::baseline());
    let xs = vec![vec![1.0, 1.0, 1.0], vec![1.0], vec![f64::NAN, 1.0, 1.0]];

    let batch = problem.evaluate(&xs).unwrap();
    assert!(batch.f[0].iter().all(|v| v.is_finite()));
    for row in 1..3 {
        assert!(batch.f[row].iter().all(|v| *v == f64::INFINITY));
        assert_eq!(batch.g[row], vec![f64::INFINITY]);
    }
}

#[test]
fn test_invalid_transition_matrix_aborts_batch() {
    let scenario = ScenarioParams {
        testing_rate: 1.0,
        trace_testing_rate: 1.0,
        experiment_start: ExperimentStart::Step(0),
        ..ScenarioParams::baseline()
    };
    let problem = lockdown_problem(&scenario);

    let err = problem.evaluate(&[vec![1.0, 1.0, 1.0]]).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        EvaluationError::Simulation(SimulationError::InvalidTransitionMatrix { .. })
    ));
}

#[test]
fn test_lockdown_bounds_must_stay_positive() {
    let result = PolicyProblem::new(
        model(),
        &ScenarioParams::baseline(),
        &PolicyControls::uniform(vec![1], 0.0, 1.0),
        &PolicyControls::absent(),
        EvaluatorConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_repeated_control_day_rejected() {
    let controls = PolicyControls::uniform(vec![1, 15, 15, 30], 0.5, 1.0);
    assert!(matches!(
        controls.validate("lockdown", f64::MIN_POSITIVE, 1.0),
        Err(ConfigError::Invalid(_))
    ));

    let result = PolicyProblem::new(
        model(),
        &ScenarioParams::baseline(),
        &PolicyControls::uniform(vec![1, 10, 20], 0.5, 1.0),
        &PolicyControls::uniform(vec![3, 3], 0.0, 0.02),
        EvaluatorConfig::default(),
    );
    assert!(result.is_err());
}
