//! Fixed biological and economic parameters
//!
//! Set once per model and never mutated. Durations are given in days and
//! converted to per-step rates by [`EpidemicParams::derive`].

use super::ConfigError;
use crate::core::time::{TimeGrid, DAYS_PER_YEAR, STEPS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Construction parameters of the epidemic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpidemicParams {
    /// Population size (persons)
    pub population: f64,

    /// Simulated calendar days
    pub horizon_days: usize,

    /// Internal steps per calendar day
    pub steps_per_day: usize,

    /// Contacts per step outside quarantine, before lockdown scaling
    pub contact_rate: f64,

    /// Contact rate in quarantine relative to `contact_rate`
    pub quarantine_contact_multiplier: f64,

    /// Infectiousness of asymptomatic carriers relative to symptomatic ones
    pub asymptomatic_relative_infectiousness: f64,

    /// Mean days from infection to symptoms
    pub days_to_symptoms: f64,

    /// Mean days from infection to recovery
    pub days_to_recovery: f64,

    /// Fraction of symptomatic cases that die
    pub case_fatality: f64,

    /// Basic reproduction number; calibrates the transmission probabilities
    pub r0: f64,

    /// Mean days until recovered individuals lose immunity
    pub immunity_days: f64,

    /// Initial unknown asymptomatic infected (persons)
    pub initial_asymptomatic: f64,

    /// Initial known symptomatic infected (persons)
    pub initial_symptomatic: f64,

    /// Productivity while quarantined, relative to working normally
    pub quarantine_productivity: f64,

    /// Step at which a vaccine arrives (may lie beyond the horizon)
    pub vaccine_step: usize,

    /// Test-and-trace efficiency η in [0, 1]
    pub trace_efficiency: f64,

    /// Cost per test performed
    pub test_cost: f64,

    /// Per-step probability that a negative test result stops being
    /// considered current
    pub knowledge_decay: f64,
}

impl Default for EpidemicParams {
    fn default() -> Self {
        Self {
            population: 100_000_000.0,
            horizon_days: 2 * DAYS_PER_YEAR,
            steps_per_day: STEPS_PER_DAY,
            contact_rate: 1.0,
            quarantine_contact_multiplier: 0.5,
            asymptomatic_relative_infectiousness: 1.0,
            days_to_symptoms: 5.0,
            days_to_recovery: 14.0,
            case_fatality: 0.01,
            r0: 2.5,
            immunity_days: 180.0,
            initial_asymptomatic: 300.0,
            initial_symptomatic: 2.0,
            quarantine_productivity: 0.5,
            vaccine_step: 800 * STEPS_PER_DAY,
            trace_efficiency: 0.0,
            test_cost: 100.0,
            knowledge_decay: 1.0 / 3.0,
        }
    }
}

/// Per-step rates derived from [`EpidemicParams`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRates {
    /// λ: contacts per step outside quarantine
    pub contact: f64,
    /// λ_Q: contacts per step in quarantine
    pub contact_quarantined: f64,
    /// δ: symptom onset
    pub symptom_onset: f64,
    /// ω_R: recovery
    pub recovery: f64,
    /// ω_D: death, implied by recovery and case fatality
    pub death: f64,
    /// γ: immunity loss
    pub immunity_loss: f64,
    /// ρ_S: transmission probability per contact with a symptomatic
    pub transmission_symptomatic: f64,
    /// ρ_A: transmission probability per contact with an asymptomatic
    pub transmission_asymptomatic: f64,
}

impl EpidemicParams {
    pub fn time_grid(&self) -> TimeGrid {
        TimeGrid::new(self.steps_per_day, self.horizon_days)
    }

    /// Check ranges; every model is built from validated parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("population", self.population)?;
        if self.steps_per_day == 0 {
            return Err(ConfigError::OutOfRange {
                field: "steps_per_day",
                value: 0.0,
                expected: "> 0",
            });
        }
        // Terminal death-rate extrapolation needs two daily samples
        if self.horizon_days < 2 {
            return Err(ConfigError::OutOfRange {
                field: "horizon_days",
                value: self.horizon_days as f64,
                expected: ">= 2",
            });
        }
        positive("contact_rate", self.contact_rate)?;
        non_negative("quarantine_contact_multiplier", self.quarantine_contact_multiplier)?;
        non_negative(
            "asymptomatic_relative_infectiousness",
            self.asymptomatic_relative_infectiousness,
        )?;
        positive("days_to_symptoms", self.days_to_symptoms)?;
        positive("days_to_recovery", self.days_to_recovery)?;
        if !(0.0..1.0).contains(&self.case_fatality) {
            return Err(ConfigError::OutOfRange {
                field: "case_fatality",
                value: self.case_fatality,
                expected: "in [0, 1)",
            });
        }
        positive("r0", self.r0)?;
        positive("immunity_days", self.immunity_days)?;
        non_negative("initial_asymptomatic", self.initial_asymptomatic)?;
        non_negative("initial_symptomatic", self.initial_symptomatic)?;
        if self.initial_asymptomatic + self.initial_symptomatic > self.population {
            return Err(ConfigError::Invalid(format!(
                "initial infected ({}) exceed population ({})",
                self.initial_asymptomatic + self.initial_symptomatic,
                self.population
            )));
        }
        non_negative("quarantine_productivity", self.quarantine_productivity)?;
        unit_interval("trace_efficiency", self.trace_efficiency)?;
        non_negative("test_cost", self.test_cost)?;
        unit_interval("knowledge_decay", self.knowledge_decay)?;
        Ok(())
    }

    /// Convert durations to per-step rates and calibrate transmission to R₀
    ///
    /// ρ_S = R₀ / ((λ/δ)·(rel_ρ + δ/(ω_R + ω_D))), ρ_A = rel_ρ·ρ_S
    pub fn derive(&self) -> DerivedRates {
        let grid = self.time_grid();
        let symptom_onset = grid.per_step_rate_for_days(self.days_to_symptoms);
        let recovery = grid.per_step_rate_for_days(self.days_to_recovery);
        let death = recovery * self.case_fatality / (1.0 - self.case_fatality);
        let rel_rho = self.asymptomatic_relative_infectiousness;

        let transmission_symptomatic = self.r0
            / ((self.contact_rate / symptom_onset)
                * (rel_rho + symptom_onset / (recovery + death)));

        DerivedRates {
            contact: self.contact_rate,
            contact_quarantined: self.quarantine_contact_multiplier * self.contact_rate,
            symptom_onset,
            recovery,
            death,
            immunity_loss: grid.per_step_rate_for_days(self.immunity_days),
            transmission_symptomatic,
            transmission_asymptomatic: rel_rho * transmission_symptomatic,
        }
    }

    /// Initial infected seeds as population fractions
    pub fn seed_fractions(&self) -> (f64, f64) {
        (
            self.initial_asymptomatic / self.population,
            self.initial_symptomatic / self.population,
        )
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: ">= 0",
        })
    }
}

pub(crate) fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "in [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EpidemicParams::default().validate().is_ok());
    }

    #[test]
    fn test_derived_rates_match_closed_form() {
        let rates = EpidemicParams::default().derive();
        assert!((rates.symptom_onset - 1.0 / 70.0).abs() < 1e-15);
        assert!((rates.recovery - 1.0 / 196.0).abs() < 1e-15);
        assert!((rates.death - rates.recovery * 0.01 / 0.99).abs() < 1e-18);
        assert_eq!(rates.contact_quarantined, 0.5);
        assert_eq!(rates.transmission_asymptomatic, rates.transmission_symptomatic);
    }

    #[test]
    fn test_r0_recovered_from_transmission() {
        let params = EpidemicParams::default();
        let r = params.derive();
        let rel = params.asymptomatic_relative_infectiousness;
        let r0 = r.transmission_symptomatic
            * (r.contact / r.symptom_onset)
            * (rel + r.symptom_onset / (r.recovery + r.death));
        assert!((r0 - params.r0).abs() < 1e-12);
    }

    #[test]
    fn test_case_fatality_of_one_rejected() {
        let params = EpidemicParams {
            case_fatality: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::OutOfRange {
                field: "case_fatality",
                ..
            })
        ));
    }

    #[test]
    fn test_single_day_horizon_rejected() {
        let params = EpidemicParams {
            horizon_days: 1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
