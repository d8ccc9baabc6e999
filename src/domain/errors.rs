//! Domain errors for the fickle-ferrets service.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while judging phrases and running experiments.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Experiment not found: {0}")]
    ExperimentNotFound(Uuid),

    #[error("Trial not found: {0}")]
    TrialNotFound(Uuid),

    #[error("Experiment {active_id} is already active")]
    ExperimentConflict { active_id: String },

    #[error("Trial already exists: {0}")]
    DuplicateTrial(Uuid),

    #[error("Champion phrase has not been seeded")]
    ChampionMissing,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExperimentNotFound(_) | Self::TrialNotFound(_) => "NOT_FOUND",
            Self::ExperimentConflict { .. } => "CONFLICT",
            Self::DuplicateTrial(_) => "DUPLICATE_KEY",
            Self::ChampionMissing => "CHAMPION_MISSING",
            Self::InvalidStateTransition { .. } => "INVALID_TRANSITION",
            Self::ValidationFailed(_) => "VALIDATION_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
