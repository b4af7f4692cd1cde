//! Review flags surfaced alongside the per-entity report.
//!
//! Flags never gate the run; they point a human at rows worth a second look
//! before the output is used for lineup building.

use serde::{Deserialize, Serialize};

use crate::models::Entity;

use super::compare::CompareRow;

/// Absolute percent delta against the reference at which a row is flagged.
pub const LARGE_DELTA_PCT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagKind {
    /// Simulated mean far from the reference projection.
    LargeDelta,
    /// Distribution built from the reference projection, not a prior.
    RookieFallback,
    /// Salary absent, so value metrics are empty.
    MissingSalary,
    /// Ownership absent, so leverage boosts and dart tags are off.
    MissingOwnership,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagRow {
    pub entity_id: String,
    pub kind: FlagKind,
    pub detail: String,
}

/// Flags for one entity, in severity order. Called per roster row, so the
/// overall flag list is deterministic in roster order.
pub fn flag_entity(
    entity: &Entity,
    compare: Option<&CompareRow>,
    rookie_fallback: bool,
) -> Vec<FlagRow> {
    let mut flags = Vec::new();
    if let Some(row) = compare {
        if row.pct_delta.abs() >= LARGE_DELTA_PCT {
            flags.push(FlagRow {
                entity_id: entity.id.clone(),
                kind: FlagKind::LargeDelta,
                detail: format!(
                    "simulated mean {:+.1}% vs reference {:.1}",
                    row.pct_delta, row.reference
                ),
            });
        }
    }
    if rookie_fallback {
        flags.push(FlagRow {
            entity_id: entity.id.clone(),
            kind: FlagKind::RookieFallback,
            detail: "no prior; sampling around the reference projection".to_string(),
        });
    }
    if entity.salary.is_none() {
        flags.push(FlagRow {
            entity_id: entity.id.clone(),
            kind: FlagKind::MissingSalary,
            detail: "no salary; value metrics omitted".to_string(),
        });
    }
    if entity.ownership_pct.is_none() {
        flags.push(FlagRow {
            entity_id: entity.id.clone(),
            kind: FlagKind::MissingOwnership,
            detail: "no projected ownership; leverage boosts disabled".to_string(),
        });
    }
    flags
}
