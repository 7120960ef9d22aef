//! End-to-end NSGA-II runs on small policy problems

use epidemic_policy_core_rs::optimizer::TerminationConfig;
use epidemic_policy_core_rs::{
    EpidemicModel, EpidemicParams, EvaluatorConfig, Nsga2, OptimizerConfig, PolicyControls,
    PolicyProblem, Problem, ScenarioParams, StopReason,
};

fn problem(lockdown: PolicyControls, testing: PolicyControls) -> PolicyProblem {
    let model = EpidemicModel::new(EpidemicParams {
        horizon_days: 30,
        ..Default::default()
    })
    .unwrap();
    PolicyProblem::new(
        model,
        &ScenarioParams::baseline().with_start_step(3 * 14),
        &lockdown,
        &testing,
        EvaluatorConfig::default(),
    )
    .unwrap()
}

fn small_config(max_generations: usize) -> OptimizerConfig {
    OptimizerConfig {
        pop_size: 8,
        n_offsprings: 4,
        termination: TerminationConfig {
            max_generations,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_generation_cap_and_evaluation_count() {
    let p = problem(
        PolicyControls::uniform(vec![1, 10], 0.5, 1.0),
        PolicyControls::absent(),
    );
    let result = Nsga2::new(small_config(3), 7).unwrap().minimize(&p).unwrap();

    assert_eq!(result.generations, 3);
    assert_eq!(result.evaluations, 8 + 4 + 4);
    assert_eq!(result.stop_reason, StopReason::MaxGenerations);
    assert!(!result.x.is_empty());
    assert_eq!(result.x.len(), result.f.len());
    assert_eq!(result.x.len(), result.g.len());
}

#[test]
fn test_solutions_respect_bounds() {
    let p = problem(
        PolicyControls::uniform(vec![1, 10], 0.5, 1.0),
        PolicyControls::uniform(vec![5], 0.0, 0.02),
    );
    let (lower, upper) = p.bounds();
    let result = Nsga2::new(small_config(3), 11).unwrap().minimize(&p).unwrap();

    for x in &result.x {
        assert_eq!(x.len(), 3);
        for ((v, lo), hi) in x.iter().zip(&lower).zip(&upper) {
            assert!(*v >= *lo && *v <= *hi, "{} outside [{}, {}]", v, lo, hi);
        }
    }
}

#[test]
fn test_same_seed_same_front() {
    let p = problem(
        PolicyControls::uniform(vec![1, 10], 0.5, 1.0),
        PolicyControls::absent(),
    );
    let a = Nsga2::new(small_config(2), 42).unwrap().minimize(&p).unwrap();
    let b = Nsga2::new(small_config(2), 42).unwrap().minimize(&p).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_no_control_evaluated_once() {
    let p = problem(PolicyControls::absent(), PolicyControls::absent());
    let result = Nsga2::new(small_config(50), 1).unwrap().minimize(&p).unwrap();

    assert_eq!(result.stop_reason, StopReason::NoVariables);
    assert_eq!(result.evaluations, 1);
    assert_eq!(result.x, vec![Vec::<f64>::new()]);
    assert_eq!(result.f.len(), 1);
}
