//! Run-level calibration diagnostics against reference projections.
//!
//! Rookie-fallback rows are excluded throughout: their distribution is built
//! from the reference itself, so including them would flatter every figure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Aggregate error statistics over (simulated mean, reference) pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Entities contributing to this bucket.
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Pearson correlation between simulated means and references. Absent
    /// when fewer than two pairs exist or either side is constant.
    pub pearson: Option<f64>,
    /// Fraction of references inside the entity's [p10, p90] band, 0..1.
    pub coverage: f64,
}

/// One entity's contribution to the diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticPoint {
    pub position: Position,
    pub simulated_mean: f64,
    pub reference: f64,
    /// Whether the reference fell inside the entity's [p10, p90] band.
    pub in_band: bool,
}

/// Per-position and pooled diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub overall: Option<ErrorStats>,
    pub by_position: BTreeMap<Position, ErrorStats>,
}

impl DiagnosticsReport {
    pub fn from_points(points: &[DiagnosticPoint]) -> Self {
        let mut by_position = BTreeMap::new();
        for pos in Position::ALL {
            let bucket: Vec<&DiagnosticPoint> =
                points.iter().filter(|p| p.position == pos).collect();
            if let Some(stats) = stats(&bucket) {
                by_position.insert(pos, stats);
            }
        }
        let all: Vec<&DiagnosticPoint> = points.iter().collect();
        DiagnosticsReport { overall: stats(&all), by_position }
    }
}

fn stats(points: &[&DiagnosticPoint]) -> Option<ErrorStats> {
    if points.is_empty() {
        return None;
    }
    let n = points.len();
    let nf = n as f64;
    let mae = points.iter().map(|p| (p.simulated_mean - p.reference).abs()).sum::<f64>() / nf;
    let rmse = (points.iter().map(|p| (p.simulated_mean - p.reference).powi(2)).sum::<f64>()
        / nf)
        .sqrt();
    let coverage = points.iter().filter(|p| p.in_band).count() as f64 / nf;
    let sims: Vec<f64> = points.iter().map(|p| p.simulated_mean).collect();
    let refs: Vec<f64> = points.iter().map(|p| p.reference).collect();
    Some(ErrorStats { n, mae, rmse, pearson: pearson(&sims, &refs), coverage })
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(pos: Position, sim: f64, reference: f64, in_band: bool) -> DiagnosticPoint {
        DiagnosticPoint { position: pos, simulated_mean: sim, reference, in_band }
    }

    #[test]
    fn test_perfect_agreement() {
        let points = vec![
            point(Position::Wr, 10.0, 10.0, true),
            point(Position::Wr, 15.0, 15.0, true),
            point(Position::Qb, 20.0, 20.0, true),
        ];
        let report = DiagnosticsReport::from_points(&points);
        let overall = report.overall.unwrap();
        assert_eq!(overall.n, 3);
        assert_eq!(overall.mae, 0.0);
        assert_eq!(overall.rmse, 0.0);
        assert!((overall.pearson.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(overall.coverage, 1.0);
    }

    #[test]
    fn test_rmse_dominated_by_outliers() {
        let points = vec![
            point(Position::Rb, 10.0, 10.0, true),
            point(Position::Rb, 10.0, 18.0, false),
        ];
        let report = DiagnosticsReport::from_points(&points);
        let stats = &report.by_position[&Position::Rb];
        assert!((stats.mae - 4.0).abs() < 1e-12);
        assert!((stats.rmse - (32.0f64).sqrt()).abs() < 1e-12);
        assert!((stats.coverage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_side_has_no_pearson() {
        let points =
            vec![point(Position::Te, 9.0, 8.0, true), point(Position::Te, 9.0, 12.0, true)];
        let report = DiagnosticsReport::from_points(&points);
        assert!(report.overall.unwrap().pearson.is_none());
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = DiagnosticsReport::from_points(&[]);
        assert!(report.overall.is_none());
        assert!(report.by_position.is_empty());
    }
}
