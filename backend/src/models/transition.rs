//! Per-step transition matrix
//!
//! Row `i` holds the probabilities of moving out of compartment `i` during
//! one step. Off-diagonal entries are set from the step's rates; the
//! diagonal is then filled so every row sums to exactly 1.

use super::compartment::{Compartment, CompartmentVector, NUM_COMPARTMENTS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute tolerance for entry bounds and row sums
pub const STOCHASTIC_TOLERANCE: f64 = 1e-9;

/// How a matrix failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Entry outside [0, 1] (beyond tolerance), or not finite
    EntryOutOfRange,
    /// Row does not sum to 1 (beyond tolerance)
    RowSum,
}

/// First offending location found by [`TransitionMatrix::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixViolation {
    pub kind: ViolationKind,
    pub row: usize,
    /// Column of the bad entry (the diagonal for row-sum failures)
    pub col: usize,
    /// Offending entry, or the row sum for row-sum failures
    pub value: f64,
}

impl fmt::Display for MatrixViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::EntryOutOfRange => write!(
                f,
                "entry ({}, {}) = {} outside [0, 1]",
                self.row, self.col, self.value
            ),
            ViolationKind::RowSum => {
                write!(f, "row {} sums to {}, expected 1", self.row, self.value)
            }
        }
    }
}

/// 12×12 row-stochastic matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    entries: [[f64; NUM_COMPARTMENTS]; NUM_COMPARTMENTS],
}

impl TransitionMatrix {
    pub fn zeros() -> Self {
        Self {
            entries: [[0.0; NUM_COMPARTMENTS]; NUM_COMPARTMENTS],
        }
    }

    /// Set the off-diagonal rate `from → to`
    pub fn set(&mut self, from: Compartment, to: Compartment, rate: f64) {
        self.entries[from.index()][to.index()] = rate;
    }

    pub fn get(&self, from: Compartment, to: Compartment) -> f64 {
        self.entries[from.index()][to.index()]
    }

    pub fn row(&self, from: Compartment) -> &[f64; NUM_COMPARTMENTS] {
        &self.entries[from.index()]
    }

    pub fn rows(&self) -> &[[f64; NUM_COMPARTMENTS]; NUM_COMPARTMENTS] {
        &self.entries
    }

    /// Set each diagonal to one minus the off-diagonal row sum
    ///
    /// Call once, after all off-diagonal rates are in place.
    pub fn fill_diagonal(&mut self) {
        for (i, row) in self.entries.iter_mut().enumerate() {
            let outflow: f64 = row
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| *p)
                .sum();
            row[i] = 1.0 - outflow;
        }
    }

    /// Check every entry lies in [0, 1] and every row sums to 1, both within
    /// [`STOCHASTIC_TOLERANCE`]. Returns the first violation in row-major
    /// order.
    pub fn validate(&self) -> Result<(), MatrixViolation> {
        for (i, row) in self.entries.iter().enumerate() {
            for (j, p) in row.iter().enumerate() {
                if !p.is_finite()
                    || *p < -STOCHASTIC_TOLERANCE
                    || *p > 1.0 + STOCHASTIC_TOLERANCE
                {
                    return Err(MatrixViolation {
                        kind: ViolationKind::EntryOutOfRange,
                        row: i,
                        col: j,
                        value: *p,
                    });
                }
            }

            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
                return Err(MatrixViolation {
                    kind: ViolationKind::RowSum,
                    row: i,
                    col: i,
                    value: sum,
                });
            }
        }
        Ok(())
    }

    /// Redistribute `current` according to the transition probabilities:
    /// `next[j] = Σ_i current[i] · P[i][j]` (i.e. `Pᵀ · current`).
    pub fn advance(&self, current: &CompartmentVector) -> CompartmentVector {
        let mass = current.as_array();
        let mut next = [0.0; NUM_COMPARTMENTS];
        for (i, row) in self.entries.iter().enumerate() {
            let m = mass[i];
            if m == 0.0 {
                continue;
            }
            for (j, p) in row.iter().enumerate() {
                next[j] += m * p;
            }
        }
        CompartmentVector::from_array(next)
    }
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self::zeros()
    }
}

impl fmt::Display for TransitionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.entries {
            let cells: Vec<String> = row.iter().map(|p| format!("{:.6e}", p)).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compartment::Compartment::*;

    #[test]
    fn test_identity_after_fill_diagonal() {
        let mut m = TransitionMatrix::zeros();
        m.fill_diagonal();
        assert!(m.validate().is_ok());

        let v = CompartmentVector::seeded(0.01, 0.0);
        assert_eq!(m.advance(&v), v);
    }

    #[test]
    fn test_advance_moves_mass() {
        let mut m = TransitionMatrix::zeros();
        m.set(UnknownNotInfected, UnknownAsymptomatic, 0.25);
        m.fill_diagonal();

        let v = CompartmentVector::seeded(0.0, 0.0);
        let next = m.advance(&v);
        assert!((next[UnknownNotInfected] - 0.75).abs() < 1e-15);
        assert!((next[UnknownAsymptomatic] - 0.25).abs() < 1e-15);
        assert!((next.total() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_outflow_above_one_is_rejected() {
        let mut m = TransitionMatrix::zeros();
        m.set(UnknownNotInfected, KnownNotInfected, 0.7);
        m.set(UnknownNotInfected, FalsePositiveQuarantined, 0.6);
        m.fill_diagonal();

        let violation = m.validate().unwrap_err();
        assert_eq!(violation.kind, ViolationKind::EntryOutOfRange);
        assert_eq!(violation.row, 0);
        assert_eq!(violation.col, 0);
        assert!(violation.value < 0.0);
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut m = TransitionMatrix::zeros();
        m.fill_diagonal();
        m.entries[3][4] = -0.5 * STOCHASTIC_TOLERANCE;
        m.entries[3][3] += 0.5 * STOCHASTIC_TOLERANCE;
        assert!(m.validate().is_ok());

        m.entries[3][4] = -2.0 * STOCHASTIC_TOLERANCE;
        m.entries[3][3] = 1.0 + 2.0 * STOCHASTIC_TOLERANCE;
        let violation = m.validate().unwrap_err();
        assert_eq!((violation.row, violation.col), (3, 3));
    }

    #[test]
    fn test_row_sum_violation_detected() {
        let mut m = TransitionMatrix::zeros();
        m.fill_diagonal();
        m.entries[5][5] = 0.9;
        let violation = m.validate().unwrap_err();
        assert_eq!(violation.kind, ViolationKind::RowSum);
        assert_eq!(violation.row, 5);
    }

    #[test]
    fn test_nan_entry_rejected() {
        let mut m = TransitionMatrix::zeros();
        m.fill_diagonal();
        m.entries[2][0] = f64::NAN;
        assert_eq!(
            m.validate().unwrap_err().kind,
            ViolationKind::EntryOutOfRange
        );
    }
}
