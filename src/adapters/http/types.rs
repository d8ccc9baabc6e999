//! Request and response bodies for the HTTP API.

use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{Experiment, ExperimentResults, VerdictEvent};

/// Largest page served by list endpoints.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const WELCOME_MESSAGE: &str = "Welcome to Fickle Ferrets! Share your words of affirmation and see if you can spark joy in our discerning ferrets.";

pub const SUBMITTED_MESSAGE: &str = "Your words have been shared with the ferrets! They're contemplating...";

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Acknowledgement for `POST /affirmation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffirmationResponse {
    pub trial_id: Uuid,
    pub phrase: String,
    pub message: String,
}

/// Body of a verdict callback.
///
/// The id is kept as a string so stale or foreign ids are acknowledged
/// and dropped instead of rejected by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictCallback {
    #[serde(alias = "affirmation_id")]
    pub trial_id: String,
    #[serde(alias = "joy_sparked")]
    pub verdict: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl VerdictCallback {
    /// The verdict event, or `None` when `trial_id` is not a UUID.
    pub fn event(&self) -> Option<VerdictEvent> {
        let trial_id = Uuid::parse_str(self.trial_id.trim()).ok()?;
        Some(VerdictEvent {
            trial_id,
            verdict: self.verdict,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// Acknowledgement for a verdict callback. Echoes the id as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictAck {
    pub status: String,
    pub trial_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct ExperimentQueryParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of `POST /experiments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExperimentRequest {
    pub name: String,
    pub variant_b_phrase: String,
    /// Falls back to the configured default
    #[serde(default)]
    pub target_runs: Option<u32>,
}

/// Tallies with computed win rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub winner: String,
    pub winning_phrase: String,
    pub variant_a_wins: u32,
    pub variant_a_total: u32,
    pub variant_a_rate: f64,
    pub variant_b_wins: u32,
    pub variant_b_total: u32,
    pub variant_b_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResponse {
    pub id: Uuid,
    pub name: String,
    pub variant_a_phrase: String,
    pub variant_b_phrase: String,
    pub status: String,
    pub target_runs: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<ResultsResponse>,
}

impl ResultsResponse {
    fn new(experiment: &Experiment, results: ExperimentResults) -> Self {
        Self {
            winner: results.winner.as_str().to_string(),
            winning_phrase: experiment.phrase_for(results.winner).to_string(),
            variant_a_wins: results.variant_a_wins,
            variant_a_total: results.variant_a_total,
            variant_a_rate: results.variant_a_rate(),
            variant_b_wins: results.variant_b_wins,
            variant_b_total: results.variant_b_total,
            variant_b_rate: results.variant_b_rate(),
        }
    }
}

impl From<Experiment> for ExperimentResponse {
    fn from(e: Experiment) -> Self {
        let results = e.results.map(|r| ResultsResponse::new(&e, r));
        Self {
            id: e.id,
            name: e.name,
            variant_a_phrase: e.variant_a_phrase,
            variant_b_phrase: e.variant_b_phrase,
            status: e.status.as_str().to_string(),
            target_runs: e.target_runs,
            created_at: e.created_at,
            completed_at: e.completed_at,
            results,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Map a domain error to its HTTP status and body.
pub fn domain_error(err: &DomainError) -> ApiError {
    let status = match err {
        DomainError::ExperimentNotFound(_) | DomainError::TrialNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::ExperimentConflict { .. }
        | DomainError::DuplicateTrial(_)
        | DomainError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        DomainError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        DomainError::ChampionMissing => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::DatabaseError(_) | DomainError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    api_error(status, err.to_string(), err.code())
}
