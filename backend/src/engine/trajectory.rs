//! Daily trajectories
//!
//! The engine streams every step into a [`TrajectoryRecorder`], which keeps
//! running sums and samples each series once per calendar day (at the last
//! step of the day). Per-step compartment vectors are not retained.

use super::rates::TraceRates;
use crate::core::time::TimeGrid;
use crate::models::{groups, Compartment, CompartmentVector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Everything one simulation produces, sampled once per day
///
/// Compartment series are population fractions; `reported` and `tests`
/// are persons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectories {
    /// Cumulative reported cases
    pub reported: Vec<f64>,
    pub not_infected: Vec<f64>,
    /// Infected and never tested (free or quarantined)
    pub unreported: Vec<f64>,
    pub infected: Vec<f64>,
    /// Infected outside quarantine, false negatives included
    pub infected_free: Vec<f64>,
    pub infected_quarantined: Vec<f64>,
    pub symptomatic: Vec<f64>,
    pub false_positives: Vec<f64>,
    pub false_negatives: Vec<f64>,
    pub recovered: Vec<f64>,
    /// Cumulative deaths
    pub dead: Vec<f64>,
    /// Productivity at the end of each day
    pub output: Vec<f64>,
    /// Tests performed during each day
    pub tests: Vec<f64>,
    pub lockdown: Vec<f64>,

    pub unknown_not_infected: Vec<f64>,
    pub unknown_not_infected_quarantined: Vec<f64>,
    pub known_not_infected: Vec<f64>,
    pub unknown_asymptomatic: Vec<f64>,
    pub unknown_asymptomatic_quarantined: Vec<f64>,
    pub known_asymptomatic_quarantined: Vec<f64>,

    pub force_of_infection: Vec<f64>,
    pub trace_rate_infected: Vec<f64>,
    pub trace_rate_not_infected: Vec<f64>,
    pub trace_rate_recovered: Vec<f64>,

    /// Sum of per-step productivity over the horizon
    pub total_output: f64,
    /// Tests performed over the horizon times the per-test cost
    pub total_testing_cost: f64,
    /// Number of simulated steps, step 0 included
    pub total_steps: usize,
    /// Compartment vector at the last step
    pub final_state: CompartmentVector,
}

impl Trajectories {
    pub fn num_days(&self) -> usize {
        self.dead.len()
    }

    /// Largest single-day test count
    pub fn peak_daily_tests(&self) -> f64 {
        self.tests.iter().copied().fold(0.0, f64::max)
    }

    /// Largest daily symptomatic fraction
    pub fn peak_symptomatic(&self) -> f64 {
        self.symptomatic.iter().copied().fold(0.0, f64::max)
    }

    /// Mean per-step productivity over the horizon
    pub fn average_output(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.total_output / self.total_steps as f64
        }
    }

    /// SHA-256 over the bit patterns of every series and scalar
    ///
    /// Two runs agree on the digest iff they are bit-for-bit identical.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for series in self.series() {
            hasher.update((series.len() as u64).to_le_bytes());
            for value in series {
                hasher.update(value.to_bits().to_le_bytes());
            }
        }
        hasher.update(self.total_output.to_bits().to_le_bytes());
        hasher.update(self.total_testing_cost.to_bits().to_le_bytes());
        hasher.update((self.total_steps as u64).to_le_bytes());
        for (_, value) in self.final_state.iter() {
            hasher.update(value.to_bits().to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn series(&self) -> [&Vec<f64>; 24] {
        [
            &self.reported,
            &self.not_infected,
            &self.unreported,
            &self.infected,
            &self.infected_free,
            &self.infected_quarantined,
            &self.symptomatic,
            &self.false_positives,
            &self.false_negatives,
            &self.recovered,
            &self.dead,
            &self.output,
            &self.tests,
            &self.lockdown,
            &self.unknown_not_infected,
            &self.unknown_not_infected_quarantined,
            &self.known_not_infected,
            &self.unknown_asymptomatic,
            &self.unknown_asymptomatic_quarantined,
            &self.known_asymptomatic_quarantined,
            &self.force_of_infection,
            &self.trace_rate_infected,
            &self.trace_rate_not_infected,
            &self.trace_rate_recovered,
        ]
    }
}

/// What the engine reports for one step
#[derive(Debug, Clone, Copy)]
pub struct StepRecord<'a> {
    pub step: usize,
    pub lockdown: f64,
    /// State after this step's transition
    pub state: &'a CompartmentVector,
    pub force_of_infection: f64,
    pub trace: TraceRates,
    /// Tests performed during this step (persons)
    pub tests: f64,
    /// Newly reported cases during this step (persons)
    pub reported: f64,
}

/// Streaming reducer from steps to [`Trajectories`]
pub struct TrajectoryRecorder {
    grid: TimeGrid,
    quarantine_productivity: f64,
    test_cost: f64,
    cumulative_reported: f64,
    tests_today: f64,
    total_tests: f64,
    out: Trajectories,
}

impl TrajectoryRecorder {
    pub fn new(grid: TimeGrid, quarantine_productivity: f64, test_cost: f64) -> Self {
        let days = grid.horizon_days();
        let mut out = Trajectories::default();
        for series in out.series_mut() {
            series.reserve_exact(days);
        }
        Self {
            grid,
            quarantine_productivity,
            test_cost,
            cumulative_reported: 0.0,
            tests_today: 0.0,
            total_tests: 0.0,
            out,
        }
    }

    /// Productivity: lockdown-scaled output of the free population plus a
    /// reduced credit for the quarantined without symptoms
    pub fn productivity(&self, state: &CompartmentVector, lockdown: f64) -> f64 {
        lockdown * state.mass(groups::PRODUCTIVE_FREE)
            + self.quarantine_productivity * state.mass(groups::PRODUCTIVE_QUARANTINED)
    }

    pub fn record(&mut self, record: StepRecord<'_>) {
        let output = self.productivity(record.state, record.lockdown);
        self.out.total_output += output;
        self.cumulative_reported += record.reported;
        self.tests_today += record.tests;
        self.total_tests += record.tests;
        self.out.total_steps = record.step + 1;
        self.out.final_state = *record.state;

        if !self.grid.is_end_of_day(record.step) {
            return;
        }

        let s = record.state;
        let o = &mut self.out;
        o.reported.push(self.cumulative_reported);
        o.not_infected.push(s.mass(groups::NOT_INFECTED));
        o.unreported.push(s.mass(groups::UNREPORTED_INFECTED));
        o.infected.push(s.mass(groups::INFECTED));
        o.infected_free.push(s.mass(groups::INFECTED_FREE));
        o.infected_quarantined.push(s.mass(groups::INFECTED_QUARANTINED));
        o.symptomatic.push(s.mass(groups::SYMPTOMATIC_QUARANTINED));
        o.false_positives.push(s.mass(groups::FALSE_POSITIVE));
        o.false_negatives.push(s.mass(groups::FALSE_NEGATIVE));
        o.recovered.push(s.mass(groups::RECOVERED));
        o.dead.push(s[Compartment::Dead]);
        o.output.push(output);
        o.tests.push(self.tests_today);
        o.lockdown.push(record.lockdown);

        o.unknown_not_infected.push(s[Compartment::UnknownNotInfected]);
        o.unknown_not_infected_quarantined
            .push(s[Compartment::UnknownNotInfectedQuarantined]);
        o.known_not_infected.push(s[Compartment::KnownNotInfected]);
        o.unknown_asymptomatic.push(s[Compartment::UnknownAsymptomatic]);
        o.unknown_asymptomatic_quarantined
            .push(s[Compartment::UnknownAsymptomaticQuarantined]);
        o.known_asymptomatic_quarantined
            .push(s[Compartment::KnownAsymptomaticQuarantined]);

        o.force_of_infection.push(record.force_of_infection);
        o.trace_rate_infected.push(record.trace.infected);
        o.trace_rate_not_infected.push(record.trace.not_infected);
        o.trace_rate_recovered.push(record.trace.recovered);

        self.tests_today = 0.0;
    }

    pub fn finish(mut self) -> Trajectories {
        self.out.total_testing_cost = self.total_tests * self.test_cost;
        self.out
    }
}

impl Trajectories {
    fn series_mut(&mut self) -> [&mut Vec<f64>; 24] {
        [
            &mut self.reported,
            &mut self.not_infected,
            &mut self.unreported,
            &mut self.infected,
            &mut self.infected_free,
            &mut self.infected_quarantined,
            &mut self.symptomatic,
            &mut self.false_positives,
            &mut self.false_negatives,
            &mut self.recovered,
            &mut self.dead,
            &mut self.output,
            &mut self.tests,
            &mut self.lockdown,
            &mut self.unknown_not_infected,
            &mut self.unknown_not_infected_quarantined,
            &mut self.known_not_infected,
            &mut self.unknown_asymptomatic,
            &mut self.unknown_asymptomatic_quarantined,
            &mut self.known_asymptomatic_quarantined,
            &mut self.force_of_infection,
            &mut self.trace_rate_infected,
            &mut self.trace_rate_not_infected,
            &mut self.trace_rate_recovered,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_days(recorder: &mut TrajectoryRecorder, grid: &TimeGrid, tests_per_step: f64) {
        let state = CompartmentVector::seeded(0.0, 0.0);
        for step in 0..grid.total_steps() {
            recorder.record(StepRecord {
                step,
                lockdown: 1.0,
                state: &state,
                force_of_infection: 0.0,
                trace: TraceRates::default(),
                tests: if step == 0 { 0.0 } else { tests_per_step },
                reported: 1.0,
            });
        }
    }

    #[test]
    fn test_daily_samples_and_sums() {
        let grid = TimeGrid::new(14, 3);
        let mut recorder = TrajectoryRecorder::new(grid, 0.5, 10.0);
        record_days(&mut recorder, &grid, 2.0);
        let t = recorder.finish();

        assert_eq!(t.num_days(), 3);
        assert_eq!(t.tests, vec![26.0, 28.0, 28.0]);
        assert_eq!(t.reported, vec![14.0, 28.0, 42.0]);
        assert_eq!(t.total_steps, 42);
        assert_eq!(t.total_testing_cost, 82.0 * 10.0);
        assert_eq!(t.total_output, 42.0);
        assert_eq!(t.peak_daily_tests(), 28.0);
    }

    #[test]
    fn test_digest_changes_with_any_value() {
        let grid = TimeGrid::new(14, 2);
        let mut a = TrajectoryRecorder::new(grid, 0.5, 10.0);
        record_days(&mut a, &grid, 1.0);
        let a = a.finish();

        let mut b = a.clone();
        assert_eq!(a.digest(), b.digest());
        b.force_of_infection[1] = f64::from_bits(b.force_of_infection[1].to_bits() + 1);
        assert_ne!(a.digest(), b.digest());
    }
}
