//! Compartment model
//!
//! The population is a probability mass spread over twelve states that
//! combine infection status, what is known about it (via testing), and
//! whether the person is quarantined.
//!
//! CRITICAL: entries are non-negative and sum to 1 at every step; `Dead`
//! never decreases.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of compartments
pub const NUM_COMPARTMENTS: usize = 12;

/// One population state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    /// Not infected, status unknown, not quarantined
    UnknownNotInfected,
    /// Not infected, status unknown, quarantined
    UnknownNotInfectedQuarantined,
    /// Tested negative, not quarantined
    KnownNotInfected,
    /// Infected asymptomatic, status unknown, not quarantined
    UnknownAsymptomatic,
    /// Infected asymptomatic, status unknown, quarantined
    UnknownAsymptomaticQuarantined,
    /// Tested positive while asymptomatic, quarantined
    KnownAsymptomaticQuarantined,
    /// Not infected but tested positive, quarantined
    FalsePositiveQuarantined,
    /// Infected but tested negative, not quarantined
    FalseNegative,
    /// Symptomatic (hence known), quarantined
    KnownSymptomaticQuarantined,
    /// Recovered, not quarantined
    Recovered,
    /// Recovered, quarantined
    RecoveredQuarantined,
    Dead,
}

impl Compartment {
    /// All compartments in vector order
    pub const ALL: [Compartment; NUM_COMPARTMENTS] = [
        Compartment::UnknownNotInfected,
        Compartment::UnknownNotInfectedQuarantined,
        Compartment::KnownNotInfected,
        Compartment::UnknownAsymptomatic,
        Compartment::UnknownAsymptomaticQuarantined,
        Compartment::KnownAsymptomaticQuarantined,
        Compartment::FalsePositiveQuarantined,
        Compartment::FalseNegative,
        Compartment::KnownSymptomaticQuarantined,
        Compartment::Recovered,
        Compartment::RecoveredQuarantined,
        Compartment::Dead,
    ];

    /// Position in the compartment vector
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Named subsets of compartments used by the force-of-infection, testing and
/// productivity calculations.
pub mod groups {
    use super::Compartment::{self, *};

    pub const QUARANTINED: &[Compartment] = &[
        UnknownNotInfectedQuarantined,
        UnknownAsymptomaticQuarantined,
        KnownAsymptomaticQuarantined,
        FalsePositiveQuarantined,
        KnownSymptomaticQuarantined,
        RecoveredQuarantined,
    ];

    pub const NOT_QUARANTINED: &[Compartment] = &[
        UnknownNotInfected,
        KnownNotInfected,
        UnknownAsymptomatic,
        FalseNegative,
        Recovered,
    ];

    /// Excludes false negatives, which are tracked separately
    pub const ASYMPTOMATIC_FREE: &[Compartment] = &[UnknownAsymptomatic];
    pub const ASYMPTOMATIC_QUARANTINED: &[Compartment] =
        &[UnknownAsymptomaticQuarantined, KnownAsymptomaticQuarantined];
    pub const SYMPTOMATIC_QUARANTINED: &[Compartment] = &[KnownSymptomaticQuarantined];
    pub const NOT_INFECTED_FREE: &[Compartment] = &[UnknownNotInfected, KnownNotInfected];
    pub const NOT_INFECTED_QUARANTINED: &[Compartment] = &[UnknownNotInfectedQuarantined];
    pub const RECOVERED_FREE: &[Compartment] = &[Recovered];
    pub const RECOVERED_QUARANTINED: &[Compartment] = &[RecoveredQuarantined];
    pub const FALSE_POSITIVE: &[Compartment] = &[FalsePositiveQuarantined];
    pub const FALSE_NEGATIVE: &[Compartment] = &[FalseNegative];

    /// Eligible for general testing
    pub const TESTABLE: &[Compartment] = &[
        UnknownNotInfected,
        UnknownNotInfectedQuarantined,
        UnknownAsymptomatic,
        UnknownAsymptomaticQuarantined,
    ];

    /// Eligible for trace testing
    pub const TRACE_TESTABLE: &[Compartment] =
        &[UnknownNotInfectedQuarantined, UnknownAsymptomaticQuarantined];

    pub const NOT_INFECTED: &[Compartment] = &[
        UnknownNotInfected,
        UnknownNotInfectedQuarantined,
        KnownNotInfected,
    ];

    pub const UNREPORTED_INFECTED: &[Compartment] =
        &[UnknownAsymptomatic, UnknownAsymptomaticQuarantined];

    pub const INFECTED: &[Compartment] = &[
        UnknownAsymptomatic,
        UnknownAsymptomaticQuarantined,
        KnownAsymptomaticQuarantined,
        FalseNegative,
        KnownSymptomaticQuarantined,
    ];

    pub const INFECTED_QUARANTINED: &[Compartment] = &[
        UnknownAsymptomaticQuarantined,
        KnownAsymptomaticQuarantined,
        KnownSymptomaticQuarantined,
    ];

    pub const INFECTED_FREE: &[Compartment] = &[UnknownAsymptomatic, FalseNegative];

    pub const RECOVERED: &[Compartment] = &[Recovered, RecoveredQuarantined];

    /// Working at full (lockdown-scaled) productivity
    pub const PRODUCTIVE_FREE: &[Compartment] = NOT_QUARANTINED;

    /// Quarantined without symptoms, working at reduced productivity
    pub const PRODUCTIVE_QUARANTINED: &[Compartment] = &[
        UnknownNotInfectedQuarantined,
        UnknownAsymptomaticQuarantined,
        KnownAsymptomaticQuarantined,
        FalsePositiveQuarantined,
        RecoveredQuarantined,
    ];
}

/// Population distribution over the twelve compartments
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompartmentVector([f64; NUM_COMPARTMENTS]);

impl CompartmentVector {
    /// All-zero vector (used for history before time 0)
    pub fn zeros() -> Self {
        Self([0.0; NUM_COMPARTMENTS])
    }

    pub fn from_array(values: [f64; NUM_COMPARTMENTS]) -> Self {
        Self(values)
    }

    /// Initial distribution: the two infected seeds, everything else
    /// unknown and not infected.
    ///
    /// # Example
    /// ```
    /// use epidemic_policy_core_rs::models::{Compartment, CompartmentVector};
    ///
    /// let v = CompartmentVector::seeded(0.001, 0.0002);
    /// assert!((v.total() - 1.0).abs() < 1e-15);
    /// assert_eq!(v[Compartment::UnknownAsymptomatic], 0.001);
    /// ```
    pub fn seeded(asymptomatic_fraction: f64, symptomatic_fraction: f64) -> Self {
        let mut v = Self::zeros();
        v[Compartment::UnknownAsymptomatic] = asymptomatic_fraction;
        v[Compartment::KnownSymptomaticQuarantined] = symptomatic_fraction;
        v[Compartment::UnknownNotInfected] = 1.0 - v.total();
        v
    }

    pub fn as_array(&self) -> &[f64; NUM_COMPARTMENTS] {
        &self.0
    }

    /// Sum of the entries in `group`
    pub fn mass(&self, group: &[Compartment]) -> f64 {
        group.iter().map(|c| self.0[c.index()]).sum()
    }

    /// Sum of all entries (1 for a valid distribution)
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compartment, f64)> + '_ {
        Compartment::ALL.iter().map(move |c| (*c, self.0[c.index()]))
    }
}

impl Index<Compartment> for CompartmentVector {
    type Output = f64;

    fn index(&self, compartment: Compartment) -> &f64 {
        &self.0[compartment.index()]
    }
}

impl IndexMut<Compartment> for CompartmentVector {
    fn index_mut(&mut self, compartment: Compartment) -> &mut f64 {
        &mut self.0[compartment.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_declaration_order() {
        for (i, c) in Compartment::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        assert_eq!(Compartment::Dead.index(), 11);
    }

    #[test]
    fn test_quarantine_groups_partition_the_living() {
        let mut seen = [0usize; NUM_COMPARTMENTS];
        for c in groups::QUARANTINED.iter().chain(groups::NOT_QUARANTINED) {
            seen[c.index()] += 1;
        }
        for (i, count) in seen.iter().enumerate() {
            let expected = if i == Compartment::Dead.index() { 0 } else { 1 };
            assert_eq!(*count, expected, "compartment {} counted {} times", i, count);
        }
    }

    #[test]
    fn test_mass_sums_group() {
        let v = CompartmentVector::from_array([
            0.5, 0.1, 0.05, 0.05, 0.02, 0.03, 0.01, 0.04, 0.05, 0.1, 0.03, 0.02,
        ]);
        assert!((v.mass(groups::QUARANTINED) - 0.24).abs() < 1e-12);
        assert!((v.mass(groups::INFECTED) - 0.19).abs() < 1e-12);
        assert!((v.total() - 1.0).abs() < 1e-12);
    }
}
