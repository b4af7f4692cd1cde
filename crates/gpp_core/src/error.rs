use thiserror::Error;

/// Stage of the run at which a fatal error was detected. Carried in error
/// variants so callers can tell a bad input apart from a degenerate sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RosterValidation,
    PriorValidation,
    ContextValidation,
    ConfigValidation,
    Environment,
    EntitySampling,
    Aggregation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::RosterValidation => "roster validation",
            Stage::PriorValidation => "prior validation",
            Stage::ContextValidation => "context validation",
            Stage::ConfigValidation => "config validation",
            Stage::Environment => "environment sampling",
            Stage::EntitySampling => "entity sampling",
            Stage::Aggregation => "aggregation",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum SimError {
    /// Malformed or missing input detected before any trial runs. The run
    /// aborts entirely; no partial results are returned.
    #[error("validation failed at {stage} for '{entity}': {reason}")]
    Validation { stage: Stage, entity: String, reason: String },

    /// An intermediate computation produced a non-finite value. A Monte
    /// Carlo output with any non-finite trial is not trustworthy in
    /// aggregate, so the whole run is discarded.
    #[error("non-finite value at {stage} for '{entity}' in trial {trial}")]
    Numerical { stage: Stage, entity: String, trial: usize },
}

impl SimError {
    pub fn validation(stage: Stage, entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::Validation { stage, entity: entity.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
