//! Decision-vector layout
//!
//! A decision vector is the lockdown control values followed by the testing
//! control values. An absent sub-policy contributes no positions.

use crate::schedule::{ControlDays, Policy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-individual decoding failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Decision vector has {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Decision variable {index} is not finite: {value}")]
    NonFinite { index: usize, value: f64 },
}

/// Where each sub-policy lives in a decision vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionLayout {
    pub lockdown: ControlDays,
    pub testing: ControlDays,
}

impl DecisionLayout {
    pub fn new(lockdown: ControlDays, testing: ControlDays) -> Self {
        Self { lockdown, testing }
    }

    /// Total decision variables
    pub fn n_var(&self) -> usize {
        self.lockdown.len() + self.testing.len()
    }

    /// Index of the first testing variable
    pub fn split(&self) -> usize {
        self.lockdown.len()
    }

    /// Column labels: lockdown control days then testing control days
    pub fn column_labels(&self) -> Vec<String> {
        self.lockdown
            .days()
            .iter()
            .chain(self.testing.days())
            .map(|day| day.to_string())
            .collect()
    }

    /// Split `x` at the lockdown boundary and pair each slice with its days
    ///
    /// # Example
    /// ```
    /// use epidemic_policy_core_rs::problem::DecisionLayout;
    /// use epidemic_policy_core_rs::ControlDays;
    ///
    /// let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15, 30]), ControlDays::Absent);
    /// let policy = layout.decode(&[0.9, 0.7, 0.8]).unwrap();
    /// assert_eq!(policy.lockdown.len(), 3);
    /// assert!(policy.testing.is_absent());
    /// ```
    pub fn decode(&self, x: &[f64]) -> Result<Policy, DecodeError> {
        if x.len() != self.n_var() {
            return Err(DecodeError::LengthMismatch {
                expected: self.n_var(),
                actual: x.len(),
            });
        }
        if let Some((index, value)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DecodeError::NonFinite {
                index,
                value: *value,
            });
        }

        let (lockdown, testing) = x.split_at(self.split());
        Ok(Policy::new(
            self.lockdown.sub_policy(lockdown),
            self.testing.sub_policy(testing),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;

    #[test]
    fn test_decode_both_sub_policies() {
        let layout = DecisionLayout::new(
            ControlDays::Days(vec![1, 15]),
            ControlDays::Days(vec![3, 30, 60]),
        );
        let policy = layout.decode(&[0.6, 0.7, 0.01, 0.02, 0.03]).unwrap();
        assert_eq!(policy.lockdown, Schedule::from_points([(1, 0.6), (15, 0.7)]));
        assert_eq!(
            policy.testing,
            Schedule::from_points([(3, 0.01), (30, 0.02), (60, 0.03)])
        );
    }

    #[test]
    fn test_both_absent_accepts_empty_vector() {
        let layout = DecisionLayout::new(ControlDays::Absent, ControlDays::Absent);
        assert_eq!(layout.n_var(), 0);
        assert_eq!(layout.decode(&[]).unwrap(), Policy::no_intervention());
    }

    #[test]
    fn test_length_mismatch() {
        let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15, 30]), ControlDays::Absent);
        assert_eq!(
            layout.decode(&[0.5; 4]),
            Err(DecodeError::LengthMismatch {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_nan_rejected() {
        let layout = DecisionLayout::new(ControlDays::Absent, ControlDays::Days(vec![1]));
        assert!(matches!(
            layout.decode(&[f64::NAN]),
            Err(DecodeError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn test_column_labels_follow_layout() {
        let layout = DecisionLayout::new(ControlDays::Days(vec![1, 15]), ControlDays::Days(vec![3]));
        assert_eq!(layout.column_labels(), vec!["1", "15", "3"]);
    }
}
