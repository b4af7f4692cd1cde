//! Salary-value metrics. Everything here is optional-in, optional-out: a
//! missing salary yields no value, never a zero.

/// Simulated mean points per $1k of salary.
pub fn points_per_1k(mean: f64, salary: Option<f64>) -> Option<f64> {
    match salary {
        Some(s) if s > 0.0 => Some(mean / (s / 1000.0)),
        _ => None,
    }
}

/// Median of the present values, `None` when the pool is empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    })
}
