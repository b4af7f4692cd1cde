//! Run provenance.
//!
//! Every output carries enough to reproduce it: the seed, the trial count,
//! and a fingerprint over the exact inputs. Two runs with equal fingerprints
//! and seeds produce bit-identical matrices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RunConfig;
use crate::error::{Result, SimError, Stage};
use crate::models::{Entity, GameContext, PriorStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub seed: u64,
    pub n_trials: usize,
    pub n_entities: usize,
    pub n_games: usize,
    pub rookie_fallback_count: usize,
    /// True when any position's boom threshold was calibrated from this
    /// run's pooled samples instead of configuration.
    pub calibrated_from_run: bool,
    /// SHA-256 over the canonical JSON of (config, entities, priors,
    /// contexts), hex-encoded.
    pub input_fingerprint: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct FingerprintInputs<'a> {
    config: &'a RunConfig,
    entities: &'a [Entity],
    priors: &'a PriorStore,
    contexts: &'a [GameContext],
}

impl RunMetadata {
    pub fn new(
        config: &RunConfig,
        entities: &[Entity],
        priors: &PriorStore,
        contexts: &[GameContext],
        rookie_fallback_count: usize,
        calibrated_from_run: bool,
    ) -> Result<Self> {
        let inputs = FingerprintInputs { config, entities, priors, contexts };
        let bytes = serde_json::to_vec(&inputs).map_err(|e| {
            SimError::validation(Stage::Aggregation, "metadata", e.to_string())
        })?;
        let digest = Sha256::digest(&bytes);
        let input_fingerprint =
            digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Ok(Self {
            seed: config.seed,
            n_trials: config.n_trials,
            n_entities: entities.len(),
            n_games: contexts.len(),
            rookie_fallback_count,
            calibrated_from_run,
            input_fingerprint,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
        })
    }
}
