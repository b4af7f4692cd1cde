//! # gpp_core - Deterministic Monte Carlo Projection Engine
//!
//! This library simulates fantasy point distributions for an NFL slate:
//! thousands of correlated trials over a roster of entities, reduced to
//! per-entity summaries, boom/leverage scores, and calibration diagnostics.
//!
//! ## Features
//! - 100% deterministic runs (same seed + same inputs = same matrix,
//!   sequential or parallel)
//! - Shared-latent-factor correlation, O(entities) work per trial
//! - Market-aware game environments with graceful fallbacks for missing
//!   lines, priors, and site fields

pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod models;

pub use config::RunConfig;
pub use engine::matrix::TrialMatrix;
pub use engine::{RunOutput, SlateSimulator};
pub use error::{Result, SimError, Stage};
pub use metadata::RunMetadata;
pub use metrics::{EntityReport, RunReport};
pub use models::{Entity, EntityPrior, GameContext, Position, PriorStore, TeamPrior};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
