//! Run configuration and fail-fast validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::correlation::CorrelationWeights;
use crate::error::{Result, SimError, Stage};
use crate::models::Position;

pub const DEFAULT_TRIALS: usize = 10_000;
pub const DEFAULT_SEED: u64 = 42;
/// League-average game total used to normalize posted totals into a tempo
/// scale factor.
pub const DEFAULT_REFERENCE_TOTAL: f64 = 45.0;

/// Caller-facing run parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub n_trials: usize,
    pub seed: u64,
    /// Quantile levels reported per entity, each in (0, 1).
    pub quantiles: Vec<f64>,
    /// Correlation strength overrides. Defaults match the factor model's
    /// contract weights.
    pub correlation: CorrelationWeights,
    /// Reference game total for tempo normalization.
    pub reference_total: f64,
    /// Position-level boom cutoffs. Positions absent from the table are
    /// calibrated from the current run's pooled samples.
    pub boom_thresholds: BTreeMap<Position, f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n_trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            quantiles: vec![0.10, 0.25, 0.50, 0.75, 0.90, 0.95],
            correlation: CorrelationWeights::default(),
            reference_total: DEFAULT_REFERENCE_TOTAL,
            boom_thresholds: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    pub fn with_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let err = |reason: &str| Err(SimError::validation(Stage::ConfigValidation, "run", reason));
        if self.n_trials == 0 {
            return err("trial count must be positive");
        }
        if self.quantiles.is_empty() {
            return err("at least one quantile level is required");
        }
        for &q in &self.quantiles {
            if !(q > 0.0 && q < 1.0) {
                return err("quantile levels must lie strictly inside (0, 1)");
            }
        }
        if !(self.reference_total > 0.0) {
            return err("reference total must be positive");
        }
        for (&pos, &cut) in &self.boom_thresholds {
            if !cut.is_finite() || cut <= 0.0 {
                return Err(SimError::validation(
                    Stage::ConfigValidation,
                    pos.as_str(),
                    "boom threshold must be positive and finite",
                ));
            }
        }
        self.correlation.validate()?;
        Ok(())
    }
}
