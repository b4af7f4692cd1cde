//! Per-entity distribution summaries.

use serde::{Deserialize, Serialize};

/// Point-distribution summary for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// (level, value) pairs in ascending level order.
    pub quantiles: Vec<(f64, f64)>,
}

/// Summarize one entity's trial column at the requested quantile levels.
pub fn summarize(values: &[f64], levels: &[f64]) -> SummaryRow {
    let mean = mean(values);
    let std_dev = std_dev(values, mean);
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut quantiles: Vec<(f64, f64)> =
        levels.iter().map(|&q| (q, quantile_sorted(&sorted, q))).collect();
    quantiles.sort_by(|a, b| a.0.total_cmp(&b.0));
    SummaryRow { mean, std_dev, quantiles }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Linearly interpolated quantile over pre-sorted samples. Monotone in `q`
/// by construction, so reported bands can never invert.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * q;
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
        }
    }
}

/// Sort-then-interpolate convenience for a single level.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// Fraction of samples at or above `cutoff`.
pub fn exceed_fraction(values: &[f64], cutoff: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v >= cutoff).count() as f64 / values.len() as f64
}
