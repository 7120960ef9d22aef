//! Per-step rate computation
//!
//! Everything the transition matrix needs for one step, computed from the
//! previous compartment vectors:
//!
//! 1. Phase selection (baseline / intervention / post-vaccine)
//! 2. Contact mix and force of infection α
//! 3. Test-and-trace quarantine rates from lagged masses

use crate::config::params::DerivedRates;
use crate::config::scenario::{QuarantineExitRates, QuarantineRates, ScenarioParams};
use crate::core::guarded_ratio;
use crate::models::{groups, CompartmentVector};
use serde::{Deserialize, Serialize};

/// Which behavioural regime applies at a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Up to and including the experiment start: no interventions
    Baseline,
    /// Scenario rates plus the scheduled testing rate
    Intervention,
    /// From vaccine arrival: as `Intervention`, without recovered quarantine entry
    PostVaccine,
}

impl Phase {
    /// Baseline takes precedence when the vaccine arrives before the start
    pub fn at(step: usize, experiment_start: usize, vaccine_step: usize) -> Phase {
        if step <= experiment_start {
            Phase::Baseline
        } else if step >= vaccine_step {
            Phase::PostVaccine
        } else {
            Phase::Intervention
        }
    }
}

/// Rates in force for one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveRates {
    pub phase: Phase,
    /// General testing probability τ
    pub testing: f64,
    /// Trace testing probability τ_TT
    pub trace_testing: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub quarantine_entry: QuarantineRates,
    pub quarantine_exit: QuarantineExitRates,
}

impl ActiveRates {
    /// Select the rates for `phase`
    ///
    /// `scheduled_testing` is the testing schedule evaluated at this step
    /// (with the scenario's general rate as default).
    pub fn select(phase: Phase, scenario: &ScenarioParams, scheduled_testing: f64) -> Self {
        match phase {
            Phase::Baseline => Self {
                phase,
                testing: 0.0,
                trace_testing: 0.0,
                sensitivity: 1.0,
                specificity: 1.0,
                quarantine_entry: QuarantineRates::default(),
                quarantine_exit: QuarantineExitRates::default(),
            },
            Phase::Intervention => Self {
                phase,
                testing: scheduled_testing,
                trace_testing: scenario.trace_testing_rate,
                sensitivity: scenario.test_sensitivity,
                specificity: scenario.test_specificity,
                quarantine_entry: scenario.quarantine_entry,
                quarantine_exit: scenario.quarantine_exit,
            },
            Phase::PostVaccine => Self {
                phase,
                testing: scheduled_testing,
                trace_testing: scenario.trace_testing_rate,
                sensitivity: scenario.test_sensitivity,
                specificity: scenario.test_specificity,
                quarantine_entry: QuarantineRates {
                    recovered: 0.0,
                    ..scenario.quarantine_entry
                },
                quarantine_exit: scenario.quarantine_exit,
            },
        }
    }
}

/// Who a contact is likely to be, and the resulting force of infection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactMix {
    /// Contact-weighted mass of everyone alive
    pub contact_mass: f64,
    /// P(contact is infected)
    pub infected: f64,
    /// P(contact is not infected)
    pub not_infected: f64,
    /// P(asymptomatic | infected contact), false negatives included
    pub asymptomatic: f64,
    /// P(symptomatic | infected contact)
    pub symptomatic: f64,
    /// α: infection probability per contact
    pub force_of_infection: f64,
}

/// Contact mix at the current state under `lockdown`
pub fn contact_mix(state: &CompartmentVector, lockdown: f64, rates: &DerivedRates) -> ContactMix {
    let free_contact = lockdown * rates.contact;
    let q_contact = rates.contact_quarantined;

    let asym_free = state.mass(groups::ASYMPTOMATIC_FREE);
    let false_neg = state.mass(groups::FALSE_NEGATIVE);
    let asym_q = state.mass(groups::ASYMPTOMATIC_QUARANTINED);
    let sym_q = state.mass(groups::SYMPTOMATIC_QUARANTINED);

    let contact_mass = free_contact * state.mass(groups::NOT_QUARANTINED)
        + q_contact * state.mass(groups::QUARANTINED);
    let infected_mass = free_contact * (asym_free + false_neg) + q_contact * (asym_q + sym_q);
    let not_infected_mass = free_contact
        * (state.mass(groups::NOT_INFECTED_FREE) + state.mass(groups::RECOVERED_FREE))
        + q_contact
            * (state.mass(groups::NOT_INFECTED_QUARANTINED)
                + state.mass(groups::RECOVERED_QUARANTINED)
                + state.mass(groups::FALSE_POSITIVE));

    let infected = guarded_ratio(infected_mass, contact_mass);
    let asymptomatic = guarded_ratio(
        free_contact * asym_free + q_contact * asym_q + free_contact * false_neg,
        infected_mass,
    );
    let symptomatic = guarded_ratio(q_contact * sym_q, infected_mass);

    ContactMix {
        contact_mass,
        infected,
        not_infected: guarded_ratio(not_infected_mass, contact_mass),
        asymptomatic,
        symptomatic,
        force_of_infection: infected
            * (symptomatic * rates.transmission_symptomatic
                + asymptomatic * rates.transmission_asymptomatic),
    }
}

/// Trace-driven quarantine-entry rates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceRates {
    /// Unknown asymptomatic → quarantined
    pub infected: f64,
    /// Unknown not-infected → quarantined
    pub not_infected: f64,
    /// Recovered → quarantined
    pub recovered: f64,
}

/// Masses the trace calculation reads
pub struct TraceInputs<'a> {
    /// State at t-1
    pub current: &'a CompartmentVector,
    /// State at t-2: the contacts who get traced
    pub contacts: &'a CompartmentVector,
    /// State at t-3: the index cases who trigger tracing
    pub index_cases: &'a CompartmentVector,
    pub lockdown: f64,
    /// Contact-weighted mass at t-1 (from [`contact_mix`])
    pub contact_mass: f64,
    /// Test-and-trace efficiency η
    pub efficiency: f64,
}

/// Test-and-trace rates for this step
///
/// Index cases three steps back either develop symptoms or test positive;
/// their contacts two steps back are traced. Each rate is η times the
/// traced mass over the current mass of the source compartment, and 0 when
/// that compartment is empty.
pub fn trace_rates(inputs: &TraceInputs<'_>, active: &ActiveRates, rates: &DerivedRates) -> TraceRates {
    let free_contact = inputs.lockdown * rates.contact;
    let q_contact = rates.contact_quarantined;
    let rho_s = rates.transmission_symptomatic;
    let rho_a = rates.transmission_asymptomatic;

    let index_free = inputs.index_cases.mass(groups::ASYMPTOMATIC_FREE);
    let index_q = inputs.index_cases.mass(groups::ASYMPTOMATIC_QUARANTINED);

    let p_symptomatic = guarded_ratio(
        rates.symptom_onset * (q_contact * index_q + free_contact * index_free),
        inputs.contact_mass,
    );
    let tested_flow = free_contact * index_free * active.testing
        + q_contact * index_q * (active.trace_testing + active.testing);
    let p_positive = guarded_ratio(tested_flow * active.sensitivity, inputs.contact_mass);
    let p_missed = guarded_ratio(tested_flow * (1.0 - active.sensitivity), inputs.contact_mass);

    let contacts_free = inputs.contacts.mass(groups::NOT_INFECTED_FREE);
    let contacts_recovered = inputs.contacts.mass(groups::RECOVERED_FREE);

    let traced_infected =
        free_contact * (p_symptomatic * rho_s + p_positive * rho_a) * contacts_free;
    let traced_not_infected = free_contact
        * (p_symptomatic * (1.0 - rho_s) + p_positive * (1.0 - rho_a) + p_missed)
        * contacts_free;
    let traced_recovered =
        free_contact * (p_symptomatic + p_positive + p_missed) * contacts_recovered;

    let eta = inputs.efficiency;
    TraceRates {
        infected: eta * guarded_ratio(traced_infected, inputs.current.mass(groups::ASYMPTOMATIC_FREE)),
        not_infected: eta
            * guarded_ratio(traced_not_infected, inputs.current.mass(groups::NOT_INFECTED_FREE)),
        recovered: eta
            * guarded_ratio(traced_recovered, inputs.current.mass(groups::RECOVERED_FREE)),
    }
}
