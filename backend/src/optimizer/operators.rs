//! Variation operators for real-valued, box-bounded variables
//!
//! - Simulated binary crossover (SBX) with bound-aware spread factors
//! - Polynomial mutation

use crate::rng::RngManager;

const EPS: f64 = 1e-14;

/// Bounded SBX on a pair of parents
///
/// Each variable is recombined with probability 0.5; children are clamped
/// to the bounds and swapped with probability 0.5.
pub fn sbx(
    p1: &[f64],
    p2: &[f64],
    lower: &[f64],
    upper: &[f64],
    eta: f64,
    rng: &mut RngManager,
) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = p1.to_vec();
    let mut c2 = p2.to_vec();

    for i in 0..p1.len() {
        if !rng.chance(0.5) || (p1[i] - p2[i]).abs() <= EPS || upper[i] <= lower[i] {
            continue;
        }
        let (y1, y2) = if p1[i] < p2[i] { (p1[i], p2[i]) } else { (p2[i], p1[i]) };
        let (lo, hi) = (lower[i], upper[i]);
        let u = rng.next_f64();

        let beta = 1.0 + 2.0 * (y1 - lo) / (y2 - y1);
        let a = (y1 + y2) - spread(beta, eta, u) * (y2 - y1);
        let beta = 1.0 + 2.0 * (hi - y2) / (y2 - y1);
        let b = (y1 + y2) + spread(beta, eta, u) * (y2 - y1);

        let a = (0.5 * a).clamp(lo, hi);
        let b = (0.5 * b).clamp(lo, hi);
        if rng.chance(0.5) {
            c1[i] = b;
            c2[i] = a;
        } else {
            c1[i] = a;
            c2[i] = b;
        }
    }
    (c1, c2)
}

fn spread(beta: f64, eta: f64, u: f64) -> f64 {
    let alpha = 2.0 - beta.powf(-(eta + 1.0));
    if u <= 1.0 / alpha {
        (u * alpha).powf(1.0 / (eta + 1.0))
    } else {
        (1.0 / (2.0 - u * alpha)).powf(1.0 / (eta + 1.0))
    }
}

/// Polynomial mutation, each variable mutated with probability `prob`
pub fn polynomial_mutation(
    x: &mut [f64],
    lower: &[f64],
    upper: &[f64],
    eta: f64,
    prob: f64,
    rng: &mut RngManager,
) {
    let power = 1.0 / (eta + 1.0);
    for i in 0..x.len() {
        let (lo, hi) = (lower[i], upper[i]);
        if hi <= lo || !rng.chance(prob) {
            continue;
        }
        let range = hi - lo;
        let y = x[i];
        let r = rng.next_f64();
        let deltaq = if r < 0.5 {
            let xy = 1.0 - (y - lo) / range;
            let val = 2.0 * r + (1.0 - 2.0 * r) * xy.powf(eta + 1.0);
            val.powf(power) - 1.0
        } else {
            let xy = 1.0 - (hi - y) / range;
            let val = 2.0 * (1.0 - r) + 2.0 * (r - 0.5) * xy.powf(eta + 1.0);
            1.0 - val.powf(power)
        };
        x[i] = (y + deltaq * range).clamp(lo, hi);
    }
}
