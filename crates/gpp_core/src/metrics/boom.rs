//! Boom probability, composite boom score, and dart tagging.
//!
//! A "boom" is a trial at or above a position-level cutoff, tightened per
//! entity so a high-projection entity cannot boom merely by hitting its own
//! median. The composite score ranks entities within their position and then
//! rewards low projected ownership and salary value, because the score
//! exists to find leverage, not just ceiling.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::Position;

/// House cutoffs, points. Callers can seed `RunConfig::boom_thresholds`
/// from this table; positions left unset are calibrated from the run's own
/// pooled samples instead.
pub static DEFAULT_BOOM_THRESHOLDS: Lazy<BTreeMap<Position, f64>> = Lazy::new(|| {
    BTreeMap::from([
        (Position::Qb, 25.0),
        (Position::Rb, 20.0),
        (Position::Wr, 18.0),
        (Position::Te, 15.0),
        (Position::Dst, 12.0),
    ])
});

/// Pooled quantile used when calibrating a missing position threshold.
pub const CALIBRATION_LEVEL: f64 = 0.90;

/// Ceiling score at or above which a low-owned entity is tagged a dart.
pub const DART_SCORE_CUTOFF: f64 = 70.0;
/// Ownership at or below which the dart tag applies, percent.
pub const DART_OWNERSHIP_CUTOFF: f64 = 5.0;

/// Boom outputs for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoomRow {
    /// Effective cutoff after the reference tightening.
    pub cutoff: f64,
    /// Fraction of trials at or above the cutoff, 0..1.
    pub boom_prob: f64,
    /// Composite leverage score, 1..100.
    pub score: f64,
    /// Low-owned, high-ceiling tag.
    pub dart: bool,
}

/// Per-entity cutoff: the position threshold, raised so an entity always has
/// to clear its own reference projection by a real margin.
pub fn cutoff(position_threshold: f64, reference: Option<f64>) -> f64 {
    match reference {
        Some(r) => position_threshold.max((1.20 * r).max(r + 5.0)),
        None => position_threshold,
    }
}

/// Percentile rank of `value` within `pool`, 0..1, ties counted as half.
pub fn percentile_rank(pool: &[f64], value: f64) -> f64 {
    if pool.is_empty() {
        return 1.0;
    }
    let below = pool.iter().filter(|&&v| v < value).count() as f64;
    let ties = pool.iter().filter(|&&v| v == value).count() as f64;
    (below + 0.5 * ties) / pool.len() as f64
}

/// Combine boom probability with the reference-beating probability. Entities
/// without a reference fall back to boom probability alone.
pub fn composite(boom_prob: f64, beat_ref_prob: Option<f64>) -> f64 {
    match beat_ref_prob {
        Some(beat) => 0.6 * boom_prob + 0.4 * beat,
        None => boom_prob,
    }
}

/// Final 1..100 score from the position-percentile of the composite plus
/// ownership and value boosts.
pub fn score(
    percentile: f64,
    ownership_pct: Option<f64>,
    value: Option<f64>,
    position_median_value: Option<f64>,
) -> f64 {
    let mut score = percentile;
    if let Some(own) = ownership_pct {
        let boost = if own <= 5.0 {
            0.20
        } else if own <= 10.0 {
            0.10
        } else if own <= 20.0 {
            0.05
        } else {
            0.0
        };
        score *= 1.0 + boost;
    }
    if let (Some(v), Some(median)) = (value, position_median_value) {
        if median > 0.0 && v > median {
            let over = ((v - median) / median).min(1.0);
            score *= 1.0 + 0.15 * over;
        }
    }
    (100.0 * score.min(1.0)).max(1.0)
}

pub fn is_dart(ownership_pct: Option<f64>, score: f64) -> bool {
    matches!(ownership_pct, Some(own) if own <= DART_OWNERSHIP_CUTOFF)
        && score >= DART_SCORE_CUTOFF
}
