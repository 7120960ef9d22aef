//! Non-dominated sorting and crowding distance

use std::cmp::Ordering;

/// Total constraint violation: sum of positive constraint values
pub fn constraint_violation(g: &[f64]) -> f64 {
    g.iter().map(|v| v.max(0.0)).sum()
}

/// Pareto dominance on objectives (minimization)
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Constrained dominance
///
/// A feasible point beats an infeasible one; two infeasible points compare
/// by total violation; two feasible points compare by Pareto dominance.
pub fn constrained_dominates(f_a: &[f64], cv_a: f64, f_b: &[f64], cv_b: f64) -> bool {
    match (cv_a <= 0.0, cv_b <= 0.0) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => cv_a < cv_b,
        (true, true) => dominates(f_a, f_b),
    }
}

/// Fast non-dominated sort
///
/// Returns fronts of indices into `f`, best front first.
pub fn non_dominated_fronts(f: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = f.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&f[i], &f[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&f[j], &f[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }
    for (i, count) in domination_count.iter().enumerate() {
        if *count == 0 {
            current.push(i);
        }
    }

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance of each member of one front
///
/// Boundary points of every objective get `+∞`.
pub fn crowding_distance(f: &[Vec<f64>], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    let mut distance = vec![0.0; n];
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let n_obj = f[front[0]].len();

    for m in 0..n_obj {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            f[front[a]][m]
                .partial_cmp(&f[front[b]][m])
                .unwrap_or(Ordering::Equal)
        });
        let lo = f[front[order[0]]][m];
        let hi = f[front[order[n - 1]]][m];
        distance[order[0]] = f64::INFINITY;
        distance[order[n - 1]] = f64::INFINITY;
        let span = hi - lo;
        if !(span.is_finite() && span > 0.0) {
            continue;
        }
        for k in 1..(n - 1) {
            let gap = f[front[order[k + 1]]][m] - f[front[order[k - 1]]][m];
            distance[order[k]] += gap / span;
        }
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance() {
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0]));
        assert!(!dominates(&[1.0, 3.0], &[1.0, 3.0]));
        assert!(!dominates(&[0.0, 4.0], &[1.0, 3.0]));
    }

    #[test]
    fn test_feasible_beats_infeasible() {
        assert!(constrained_dominates(&[9.0], 0.0, &[1.0], 0.1));
        assert!(constrained_dominates(&[9.0], 0.1, &[1.0], 0.2));
        assert!(!constrained_dominates(&[9.0], 0.3, &[1.0], 0.2));
    }

    #[test]
    fn test_fronts() {
        let f = vec![
            vec![1.0, 4.0],
            vec![2.0, 2.0],
            vec![4.0, 1.0],
            vec![3.0, 3.0],
            vec![5.0, 5.0],
        ];
        let fronts = non_dominated_fronts(&f);
        assert_eq!(fronts.len(), 3);
        let mut first = fronts[0].clone();
        first.sort();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
    }

    #[test]
    fn test_crowding_extremes_infinite() {
        let f = vec![vec![1.0, 4.0], vec![2.0, 2.0], vec![4.0, 1.0]];
        let d = crowding_distance(&f, &[0, 1, 2]);
        assert!(d[0].is_infinite());
        assert!(d[2].is_infinite());
        assert!((d[1] - 2.0).abs() < 1e-12);
    }
}
