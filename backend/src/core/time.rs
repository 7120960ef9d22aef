//! Time grid for the simulation
//!
//! The engine advances in discrete steps. A fixed number of steps form a
//! calendar day, and daily series are sampled at the last step of each day.
//! This module also owns the conversions between daily and per-step rates.

use serde::{Deserialize, Serialize};

/// Internal steps per calendar day used throughout the engine.
pub const STEPS_PER_DAY: usize = 14;

/// Days per year used when converting year-denominated parameters.
pub const DAYS_PER_YEAR: usize = 365;

/// Discrete simulation clock: `horizon_days` calendar days of
/// `steps_per_day` steps each.
///
/// # Example
/// ```
/// use epidemic_policy_core_rs::TimeGrid;
///
/// let grid = TimeGrid::new(14, 10);
/// assert_eq!(grid.total_steps(), 140);
/// assert_eq!(grid.day_of(27), 1);
/// assert!(grid.is_end_of_day(13));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGrid {
    steps_per_day: usize,
    horizon_days: usize,
}

impl TimeGrid {
    /// Create a new grid
    ///
    /// # Panics
    /// Panics if `steps_per_day` is zero.
    pub fn new(steps_per_day: usize, horizon_days: usize) -> Self {
        assert!(steps_per_day > 0, "steps_per_day must be positive");
        Self {
            steps_per_day,
            horizon_days,
        }
    }

    pub fn steps_per_day(&self) -> usize {
        self.steps_per_day
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    /// Total number of steps in the horizon (step 0 is the initial state)
    pub fn total_steps(&self) -> usize {
        self.steps_per_day * self.horizon_days
    }

    /// Calendar day (0-indexed) containing `step`
    pub fn day_of(&self, step: usize) -> usize {
        step / self.steps_per_day
    }

    /// First step of `day`
    pub fn step_of_day(&self, day: usize) -> usize {
        day * self.steps_per_day
    }

    /// True for the last step of a day, where daily samples are taken
    pub fn is_end_of_day(&self, step: usize) -> bool {
        step % self.steps_per_day == self.steps_per_day - 1
    }

    /// Convert a daily probability into the per-step probability that
    /// compounds to it over one day: `(1 + p)^(1/steps_per_day) - 1`.
    ///
    /// # Example
    /// ```
    /// use epidemic_policy_core_rs::TimeGrid;
    ///
    /// let grid = TimeGrid::new(14, 1);
    /// let per_step = grid.daily_to_step_rate(0.5);
    /// assert!(((1.0 + per_step).powi(14) - 1.5).abs() < 1e-12);
    /// assert_eq!(grid.daily_to_step_rate(0.0), 0.0);
    /// ```
    pub fn daily_to_step_rate(&self, daily: f64) -> f64 {
        if daily == 0.0 {
            return 0.0;
        }
        (1.0 + daily).powf(1.0 / self.steps_per_day as f64) - 1.0
    }

    /// Convert a mean duration in days into a per-step exit rate.
    pub fn per_step_rate_for_days(&self, days: f64) -> f64 {
        1.0 / (self.steps_per_day as f64 * days)
    }

    /// Convert a duration in years into whole steps, rounded to nearest.
    pub fn years_to_steps(&self, years: f64) -> usize {
        (self.steps_per_day as f64 * DAYS_PER_YEAR as f64 * years).round() as usize
    }
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::new(STEPS_PER_DAY, 2 * DAYS_PER_YEAR)
    }
}
