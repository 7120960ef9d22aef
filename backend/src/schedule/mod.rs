//! Piecewise-constant policy schedules
//!
//! A policy is a pair of sparse step functions over calendar days: a
//! lockdown multiplier on the contact rate and a general testing rate.
//! Either may be absent, in which case a fixed default applies throughout.
//!
//! # Evaluation rule
//!
//! At step `t`, a schedule returns the value of the largest control day `d`
//! with `d * steps_per_day <= t`, or the caller's default when no control
//! day qualifies yet. The result never depends on the order in which the
//! control points were supplied.
//!
//! ```text
//! {10: 0.3, 60: 0.6}, 14 steps/day
//!
//!   step:   0 ........ 139 | 140 ........ 839 | 840 ........
//!   value:  default        | 0.3              | 0.6
//! ```

use crate::core::time::STEPS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sub-policy: either absent or a mapping from calendar day to value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// No intervention; the default applies for all time
    #[default]
    Absent,

    /// Control points keyed by calendar day
    Scheduled(BTreeMap<u32, f64>),
}

impl Schedule {
    /// Build a schedule from `(day, value)` pairs in any order
    ///
    /// A repeated day keeps the last value supplied for it.
    ///
    /// # Example
    /// ```
    /// use epidemic_policy_core_rs::Schedule;
    ///
    /// let schedule = Schedule::from_points([(60, 0.6), (10, 0.3)]);
    /// assert_eq!(schedule.value_at(139, 1.0), 1.0);
    /// assert_eq!(schedule.value_at(140, 1.0), 0.3);
    /// assert_eq!(schedule.value_at(840, 1.0), 0.6);
    /// ```
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        Schedule::Scheduled(points.into_iter().collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Schedule::Absent)
    }

    /// Number of control points (0 when absent)
    pub fn len(&self) -> usize {
        match self {
            Schedule::Absent => 0,
            Schedule::Scheduled(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `step` on the engine's default clock of 14 steps per day
    pub fn value_at(&self, step: usize, default: f64) -> f64 {
        self.value_at_with(step, STEPS_PER_DAY, default)
    }

    /// Value at `step` for an arbitrary number of steps per day
    pub fn value_at_with(&self, step: usize, steps_per_day: usize, default: f64) -> f64 {
        match self {
            Schedule::Absent => default,
            Schedule::Scheduled(points) => points
                .iter()
                .rev()
                .find(|(day, _)| (**day as usize).saturating_mul(steps_per_day) <= step)
                .map(|(_, value)| *value)
                .unwrap_or(default),
        }
    }
}

/// Control days of one sub-policy, as declared by a run configuration
///
/// `Absent` contributes no decision variables. `Days` maps decision-vector
/// position `i` to control day `days[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlDays {
    Absent,
    Days(Vec<u32>),
}

impl ControlDays {
    pub fn is_absent(&self) -> bool {
        matches!(self, ControlDays::Absent)
    }

    /// Number of decision variables this sub-policy contributes
    pub fn len(&self) -> usize {
        match self {
            ControlDays::Absent => 0,
            ControlDays::Days(days) => days.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> &[u32] {
        match self {
            ControlDays::Absent => &[],
            ControlDays::Days(days) => days,
        }
    }

    /// Pair control days with decision values, position by position
    ///
    /// Returns [`Schedule::Absent`] for absent control days regardless of
    /// `values`. The caller guarantees `values.len() == self.len()`.
    pub fn sub_policy(&self, values: &[f64]) -> Schedule {
        match self {
            ControlDays::Absent => Schedule::Absent,
            ControlDays::Days(days) => {
                Schedule::from_points(days.iter().copied().zip(values.iter().copied()))
            }
        }
    }
}

/// A complete intervention policy: lockdown strength and testing intensity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Multiplier on the contact rate, domain (0, 1]; default 1.0
    pub lockdown: Schedule,

    /// Per-step general testing probability; default is the scenario's rate
    pub testing: Schedule,
}

impl Policy {
    pub fn new(lockdown: Schedule, testing: Schedule) -> Self {
        Self { lockdown, testing }
    }

    /// Neither lockdown nor scheduled testing
    pub fn no_intervention() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_schedule_returns_default() {
        let schedule = Schedule::Absent;
        assert_eq!(schedule.value_at(0, 0.7), 0.7);
        assert_eq!(schedule.value_at(usize::MAX, 0.7), 0.7);
    }

    #[test]
    fn test_empty_schedule_returns_default() {
        let schedule = Schedule::from_points(Vec::new());
        assert_eq!(schedule.value_at(10_000, 1.0), 1.0);
    }

    #[test]
    fn test_day_zero_applies_from_first_step() {
        let schedule = Schedule::from_points([(0, 0.5)]);
        assert_eq!(schedule.value_at(0, 1.0), 0.5);
    }

    #[test]
    fn test_repeated_day_keeps_last_value() {
        let schedule = Schedule::from_points([(5, 0.2), (5, 0.4)]);
        assert_eq!(schedule.value_at(70, 1.0), 0.4);
    }

    #[test]
    fn test_sub_policy_pairs_positions() {
        let days = ControlDays::Days(vec![1, 15, 30]);
        let schedule = days.sub_policy(&[0.9, 0.8, 0.7]);
        assert_eq!(schedule.value_at(14, 1.0), 0.9);
        assert_eq!(schedule.value_at(15 * 14, 1.0), 0.8);
        assert_eq!(schedule.value_at(30 * 14, 1.0), 0.7);
    }

    #[test]
    fn test_absent_control_days_ignore_values() {
        let schedule = ControlDays::Absent.sub_policy(&[0.1, 0.2]);
        assert!(schedule.is_absent());
    }
}
