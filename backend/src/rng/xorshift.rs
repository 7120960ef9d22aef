//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG with 64-bit state. The optimizer draws every
//! random number from one [`RngManager`], so a seed fixes the whole search:
//! initial sampling, tournament pairing, crossover and mutation.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use epidemic_policy_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let u = rng.next_f64();
/// assert!((0.0..1.0).contains(&u));
/// let i = rng.index(10);
/// assert!(i < 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG; a zero seed is replaced by 1
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Next raw 64-bit value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Uniform f64 in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform f64 in [low, high); returns `low` when the interval is empty
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.next_f64()
    }

    /// Uniform index in [0, n)
    ///
    /// # Panics
    /// Panics if `n == 0`
    pub fn index(&mut self, n: usize) -> usize {
        assert!(n > 0, "index range must be non-empty");
        (self.next() % n as u64) as usize
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}
