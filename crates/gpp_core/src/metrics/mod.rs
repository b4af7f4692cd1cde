//! Aggregation of the trial matrix into per-entity and run-level reports.

pub mod boom;
pub mod compare;
pub mod diagnostics;
pub mod flags;
pub mod summary;
pub mod value;

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::engine::matrix::TrialMatrix;
use crate::error::{Result, SimError, Stage};
use crate::models::{Entity, Position};
pub use self::boom::BoomRow;
pub use self::compare::CompareRow;
pub use self::diagnostics::{DiagnosticsReport, ErrorStats};
pub use self::flags::{FlagKind, FlagRow};
pub use self::summary::SummaryRow;

/// Everything reported for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity_id: String,
    pub name: String,
    pub position: Position,
    pub rookie_fallback: bool,
    pub summary: SummaryRow,
    pub boom: BoomRow,
    /// Mean points per $1k of salary; absent without a salary.
    pub value: Option<f64>,
    /// p90 points per $1k of salary; absent without a salary.
    pub ceiling_value: Option<f64>,
    /// Reference comparison; absent without a reference projection.
    pub compare: Option<CompareRow>,
}

/// Aggregated output of one run, in roster order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub rows: Vec<EntityReport>,
    pub diagnostics: DiagnosticsReport,
    pub flags: Vec<FlagRow>,
    /// Positions whose boom threshold came from this run's pooled samples
    /// rather than configuration.
    pub calibrated_positions: Vec<Position>,
}

impl RunReport {
    pub fn build(
        matrix: &TrialMatrix,
        entities: &[Entity],
        fallback: &[bool],
        config: &RunConfig,
    ) -> Result<Self> {
        if matrix.n_entities() != entities.len() || fallback.len() != entities.len() {
            return Err(SimError::validation(
                Stage::Aggregation,
                "matrix",
                "matrix width does not match the roster",
            ));
        }

        let columns: Vec<Vec<f64>> = (0..entities.len()).map(|i| matrix.column(i)).collect();
        let summaries: Vec<SummaryRow> =
            columns.iter().map(|c| summary::summarize(c, &config.quantiles)).collect();

        let (thresholds, calibrated_positions) =
            resolve_thresholds(entities, &columns, fallback, config);

        // Pass 1: per-entity boom probability, composite, value.
        let mut composites = Vec::with_capacity(entities.len());
        let mut cutoffs = Vec::with_capacity(entities.len());
        let mut values = Vec::with_capacity(entities.len());
        let mut compares: Vec<Option<CompareRow>> = Vec::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            // A position with entities always has a threshold by now.
            let threshold = thresholds.get(&entity.position).copied().unwrap_or(0.0);
            let cut = boom::cutoff(threshold, entity.reference_projection);
            let boom_prob = summary::exceed_fraction(&columns[i], cut);
            let cmp = entity
                .reference_projection
                .map(|r| compare::compare(&columns[i], summaries[i].mean, r));
            composites.push(boom::composite(boom_prob, cmp.as_ref().map(|c| c.beat_prob)));
            cutoffs.push((cut, boom_prob));
            values.push(value::points_per_1k(summaries[i].mean, entity.salary));
            compares.push(cmp);
        }

        // Position pools for the percentile rank and the value median.
        let mut composite_pools: BTreeMap<Position, Vec<f64>> = BTreeMap::new();
        let mut value_pools: BTreeMap<Position, Vec<f64>> = BTreeMap::new();
        for (i, entity) in entities.iter().enumerate() {
            composite_pools.entry(entity.position).or_default().push(composites[i]);
            if let Some(v) = values[i] {
                value_pools.entry(entity.position).or_default().push(v);
            }
        }
        let value_medians: BTreeMap<Position, f64> = value_pools
            .iter()
            .filter_map(|(&pos, pool)| value::median(pool).map(|m| (pos, m)))
            .collect();

        // Pass 2: assemble rows and flags.
        let mut rows = Vec::with_capacity(entities.len());
        let mut flag_rows = Vec::new();
        let mut diag_points = Vec::new();
        for (i, entity) in entities.iter().enumerate() {
            let pool = &composite_pools[&entity.position];
            let percentile = boom::percentile_rank(pool, composites[i]);
            let score = boom::score(
                percentile,
                entity.ownership_pct,
                values[i],
                value_medians.get(&entity.position).copied(),
            );
            let (cut, boom_prob) = cutoffs[i];
            let boom_row = BoomRow {
                cutoff: cut,
                boom_prob,
                score,
                dart: boom::is_dart(entity.ownership_pct, score),
            };

            let p90 = summary::quantile(&columns[i], 0.90);
            if !fallback[i] {
                if let Some(reference) = entity.reference_projection {
                    let p10 = summary::quantile(&columns[i], 0.10);
                    diag_points.push(diagnostics::DiagnosticPoint {
                        position: entity.position,
                        simulated_mean: summaries[i].mean,
                        reference,
                        in_band: reference >= p10 && reference <= p90,
                    });
                }
            }

            flag_rows.extend(flags::flag_entity(entity, compares[i].as_ref(), fallback[i]));
            rows.push(EntityReport {
                entity_id: entity.id.clone(),
                name: entity.name.clone(),
                position: entity.position,
                rookie_fallback: fallback[i],
                summary: summaries[i].clone(),
                boom: boom_row,
                value: values[i],
                ceiling_value: value::points_per_1k(p90, entity.salary),
                compare: compares[i].clone(),
            });
        }

        debug!(
            "aggregated {} rows, {} flags, {} diagnostic points",
            rows.len(),
            flag_rows.len(),
            diag_points.len()
        );
        Ok(RunReport {
            rows,
            diagnostics: DiagnosticsReport::from_points(&diag_points),
            flags: flag_rows,
            calibrated_positions,
        })
    }
}

/// Boom threshold per position: configured value first, otherwise the pooled
/// calibration quantile over the position's prior-backed columns. Fallback
/// columns only enter the pool when a position has nothing else.
fn resolve_thresholds(
    entities: &[Entity],
    columns: &[Vec<f64>],
    fallback: &[bool],
    config: &RunConfig,
) -> (BTreeMap<Position, f64>, Vec<Position>) {
    let mut thresholds = BTreeMap::new();
    let mut calibrated = Vec::new();
    for pos in Position::ALL {
        if let Some(&t) = config.boom_thresholds.get(&pos) {
            thresholds.insert(pos, t);
            continue;
        }
        let pool_indices = |include_fallback: bool| -> Vec<usize> {
            entities
                .iter()
                .enumerate()
                .filter(|(i, e)| e.position == pos && (include_fallback || !fallback[*i]))
                .map(|(i, _)| i)
                .collect()
        };
        let mut indices = pool_indices(false);
        if indices.is_empty() {
            indices = pool_indices(true);
        }
        if indices.is_empty() {
            continue;
        }
        let pooled: Vec<f64> =
            indices.iter().flat_map(|&i| columns[i].iter().copied()).collect();
        let t = summary::quantile(&pooled, boom::CALIBRATION_LEVEL);
        debug!("calibrated {pos} boom threshold at {t:.2} from {} columns", indices.len());
        thresholds.insert(pos, t);
        calibrated.push(pos);
    }
    (thresholds, calibrated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wr(id: &str) -> Entity {
        Entity::new(id, id, Position::Wr, "KC", "LV")
            .with_salary(6000.0)
            .with_ownership(12.0)
    }

    /// Two WRs with linear ramps 0..n and 0..2n, plus a rookie.
    fn fixture() -> (TrialMatrix, Vec<Entity>, Vec<bool>) {
        let n = 100;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|t| {
                let x = t as f64;
                vec![x * 0.2, x * 0.4, 8.0]
            })
            .collect();
        let matrix = TrialMatrix::from_rows(rows, 3);
        let entities = vec![
            wr("WR_LOW").with_reference(10.0),
            wr("WR_HIGH").with_reference(20.0),
            wr("WR_ROOKIE").with_reference(8.0),
        ];
        (matrix, entities, vec![false, false, true])
    }

    #[test]
    fn test_build_report_shapes() {
        let (matrix, entities, fallback) = fixture();
        let config = RunConfig::default();
        let report = RunReport::build(&matrix, &entities, &fallback, &config).unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.calibrated_positions, vec![Position::Wr]);
        // Rookie contributes no diagnostics point.
        assert_eq!(report.diagnostics.overall.as_ref().unwrap().n, 2);
    }

    #[test]
    fn test_higher_ceiling_scores_higher() {
        let (matrix, entities, fallback) = fixture();
        let report =
            RunReport::build(&matrix, &entities, &fallback, &RunConfig::default()).unwrap();
        assert!(report.rows[1].boom.score > report.rows[0].boom.score);
    }

    #[test]
    fn test_configured_threshold_skips_calibration() {
        let (matrix, entities, fallback) = fixture();
        let mut config = RunConfig::default();
        config.boom_thresholds.insert(Position::Wr, 18.0);
        let report = RunReport::build(&matrix, &entities, &fallback, &config).unwrap();
        assert!(report.calibrated_positions.is_empty());
        // Cutoff still tightened by the reference for the high projection.
        assert!(report.rows[1].boom.cutoff >= 25.0);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let (matrix, mut entities, mut fallback) = fixture();
        entities.pop();
        fallback.pop();
        assert!(RunReport::build(&matrix, &entities, &fallback, &RunConfig::default()).is_err());
    }

    #[test]
    fn test_value_uses_salary() {
        let (matrix, entities, fallback) = fixture();
        let report =
            RunReport::build(&matrix, &entities, &fallback, &RunConfig::default()).unwrap();
        // WR_LOW mean is ~9.9 over a 0..19.8 ramp at $6k.
        let v = report.rows[0].value.unwrap();
        assert!((v - 9.9 / 6.0).abs() < 1e-9);
    }
}
