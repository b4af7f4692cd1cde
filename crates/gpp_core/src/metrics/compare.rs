//! Simulation-versus-reference comparison.

use serde::{Deserialize, Serialize};

use super::summary;

/// Comparison of the simulated distribution against an external reference
/// projection. Only built for entities that carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRow {
    pub reference: f64,
    /// Simulated mean minus reference, points.
    pub delta_mean: f64,
    /// Delta as a percentage of the reference, with the denominator floored
    /// at one point so near-zero projections cannot explode the figure.
    pub pct_delta: f64,
    /// Fraction of trials at or above the reference, 0..1.
    pub beat_prob: f64,
}

pub fn compare(column: &[f64], mean: f64, reference: f64) -> CompareRow {
    let delta_mean = mean - reference;
    let pct_delta = 100.0 * delta_mean / reference.abs().max(1.0);
    let beat_prob = summary::exceed_fraction(column, reference);
    CompareRow { reference, delta_mean, pct_delta, beat_prob }
}
