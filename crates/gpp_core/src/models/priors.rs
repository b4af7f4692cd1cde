//! Prior tables consumed by the sampling engine.
//!
//! Priors are produced by an external historical-aggregation job and are
//! read-only for the whole run. Parameter validity is checked once, before
//! any trial executes; a bad prior is a configuration defect, never a
//! per-trial recoverable condition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError, Stage};
use crate::models::entity::Position;

/// Team-level statistical parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPrior {
    pub team: String,
    /// Plays per game, mean and spread.
    pub tempo_mean: f64,
    pub tempo_std: f64,
    /// Neutral pass-play fraction.
    pub base_pass_mix: f64,
    /// Pass-rate-over-expected style adjustment, added to the baseline.
    pub mix_adjustment: f64,
    /// Offensive efficiency, points per play. Drives the opposing DST's
    /// points-allowed distribution.
    pub efficiency_mean: f64,
}

/// Entity-level distribution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPrior {
    pub entity_id: String,
    pub position: Position,
    /// Beta shape parameters for the opportunity share.
    pub usage_alpha: f64,
    pub usage_beta: f64,
    /// Output per opportunity (yards per attempt/carry/target; points per
    /// play for DST).
    pub efficiency_mean: f64,
    pub efficiency_std: f64,
    /// Gamma shape/rate for the per-opportunity scoring-event rate.
    pub event_shape: f64,
    pub event_rate: f64,
}

impl EntityPrior {
    /// Mean and standard deviation of the Beta usage distribution. Used to
    /// transform shared correlation factors into usage space.
    pub fn usage_moments(&self) -> (f64, f64) {
        let a = self.usage_alpha;
        let b = self.usage_beta;
        let mean = a / (a + b);
        let var = a * b / ((a + b) * (a + b) * (a + b + 1.0));
        (mean, var.sqrt())
    }

    fn validate(&self) -> Result<()> {
        let err = |reason: &str| {
            Err(SimError::validation(Stage::PriorValidation, &self.entity_id, reason))
        };
        if !(self.usage_alpha > 0.0) || !(self.usage_beta > 0.0) {
            return err("usage shape parameters must be positive");
        }
        if !(self.efficiency_std > 0.0) {
            return err("efficiency std must be positive");
        }
        if !self.efficiency_mean.is_finite() || self.efficiency_mean <= 0.0 {
            return err("efficiency mean must be positive and finite");
        }
        if !(self.event_shape > 0.0) || !(self.event_rate > 0.0) {
            return err("event rate parameters must be positive");
        }
        Ok(())
    }
}

/// Read-only prior store, loaded once per run and shared across workers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorStore {
    pub teams: Vec<TeamPrior>,
    pub entities: Vec<EntityPrior>,
}

impl PriorStore {
    pub fn new(teams: Vec<TeamPrior>, entities: Vec<EntityPrior>) -> Self {
        Self { teams, entities }
    }

    /// Validate every parameter and build lookup indices. Fails fast on the
    /// first structural defect.
    pub fn index(&self) -> Result<PriorIndex<'_>> {
        let mut teams = HashMap::new();
        for prior in &self.teams {
            if !(prior.tempo_std > 0.0) {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.team,
                    "tempo std must be positive",
                ));
            }
            if !(prior.tempo_mean > 0.0) {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.team,
                    "tempo mean must be positive",
                ));
            }
            let mix = prior.base_pass_mix + prior.mix_adjustment;
            if !(0.0..=1.0).contains(&mix) {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.team,
                    "pass mix plus adjustment must lie in [0, 1]",
                ));
            }
            if !(prior.efficiency_mean > 0.0) {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.team,
                    "efficiency mean must be positive",
                ));
            }
            if teams.insert(prior.team.as_str(), prior).is_some() {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.team,
                    "duplicate team prior",
                ));
            }
        }

        let mut entities = HashMap::new();
        for prior in &self.entities {
            prior.validate()?;
            if entities.insert(prior.entity_id.as_str(), prior).is_some() {
                return Err(SimError::validation(
                    Stage::PriorValidation,
                    &prior.entity_id,
                    "duplicate entity prior",
                ));
            }
        }

        Ok(PriorIndex { teams, entities })
    }
}

/// Borrowed lookup view over a validated `PriorStore`.
#[derive(Debug)]
pub struct PriorIndex<'a> {
    teams: HashMap<&'a str, &'a TeamPrior>,
    entities: HashMap<&'a str, &'a EntityPrior>,
}

impl<'a> PriorIndex<'a> {
    pub fn team(&self, team: &str) -> Option<&'a TeamPrior> {
        self.teams.get(team).copied()
    }

    /// Missing entity prior is the rookie-fallback condition, not an error.
    pub fn entity(&self, entity_id: &str) -> Option<&'a EntityPrior> {
        self.entities.get(entity_id).copied()
    }
}
