//! Tests for piecewise-constant policy schedules

use epidemic_policy_core_rs::{ControlDays, Policy, Schedule};
use proptest::prelude::*;

#[test]
fn test_two_point_schedule_boundaries() {
    let schedule = Schedule::from_points([(10, 0.3), (60, 0.6)]);

    assert_eq!(schedule.value_at(139, 1.0), 1.0);
    assert_eq!(schedule.value_at(140, 1.0), 0.3);
    assert_eq!(schedule.value_at(839, 1.0), 0.3);
    assert_eq!(schedule.value_at(840, 1.0), 0.6);
    assert_eq!(schedule.value_at(10_219, 1.0), 0.6);
}

#[test]
fn test_absent_schedule_uses_caller_default() {
    let policy = Policy::no_intervention();
    assert!(policy.lockdown.is_absent());
    assert_eq!(policy.lockdown.value_at(500, 1.0), 1.0);
    assert_eq!(policy.testing.value_at(500, 0.004), 0.004);
}

#[test]
fn test_custom_steps_per_day() {
    let schedule = Schedule::from_points([(2, 0.5)]);
    assert_eq!(schedule.value_at_with(3, 2, 1.0), 1.0);
    assert_eq!(schedule.value_at_with(4, 2, 1.0), 0.5);
}

#[test]
fn test_control_days_build_sub_policy() {
    let days = ControlDays::Days(vec![1, 15, 30]);
    assert_eq!(days.len(), 3);

    let schedule = days.sub_policy(&[0.9, 0.8, 0.7]);
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule.value_at(13, 1.0), 1.0);
    assert_eq!(schedule.value_at(14, 1.0), 0.9);
    assert_eq!(schedule.value_at(30 * 14, 1.0), 0.7);
}

proptest! {
    #[test]
    fn prop_value_independent_of_point_order(
        points in prop::collection::btree_map(0u32..200, 0.0f64..1.0, 0..12),
        step in 0usize..3000,
    ) {
        let forward: Vec<(u32, f64)> = points.iter().map(|(d, v)| (*d, *v)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = Schedule::from_points(forward);
        let b = Schedule::from_points(backward);
        prop_assert_eq!(a.value_at(step, 1.0), b.value_at(step, 1.0));
    }

    #[test]
    fn prop_value_is_latest_reached_control_point(
        points in prop::collection::btree_map(0u32..200, 0.0f64..1.0, 1..12),
        step in 0usize..3000,
    ) {
        let expected = points
            .iter()
            .filter(|(day, _)| (**day as usize) * 14 <= step)
            .last()
            .map(|(_, v)| *v)
            .unwrap_or(-1.0);
        let schedule = Schedule::from_points(points.clone());
        prop_assert_eq!(schedule.value_at(step, -1.0), expected);
    }
}
