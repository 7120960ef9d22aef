//! Time management and numeric helpers shared by the engine

pub mod time;

/// Divide `numerator` by `denominator`, defining the result as 0 when the
/// denominator is exactly zero.
///
/// Used for ratios whose source population can be empty (e.g. trace rates
/// out of a compartment holding no mass). No NaN is ever produced for a
/// zero denominator.
///
/// # Example
/// ```
/// use epidemic_policy_core_rs::core::guarded_ratio;
///
/// assert_eq!(guarded_ratio(1.0, 4.0), 0.25);
/// assert_eq!(guarded_ratio(0.0, 0.0), 0.0);
/// assert_eq!(guarded_ratio(3.0, 0.0), 0.0);
/// ```
pub fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
