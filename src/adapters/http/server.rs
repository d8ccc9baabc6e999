//! HTTP server for the judging API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::types::{
    api_error, domain_error, AffirmationResponse, ApiResult, CreateExperimentRequest,
    ExperimentQueryParams, ExperimentResponse, HealthResponse, HistoryParams, MessageResponse,
    VerdictAck, VerdictCallback, MAX_PAGE_SIZE, SUBMITTED_MESSAGE, WELCOME_MESSAGE,
};
use crate::domain::errors::DomainError;
use crate::domain::models::{ChampionPhrase, ExperimentStatus, ServerConfig, Trial};
use crate::domain::ports::{
    ChampionRepository, ExperimentFilter, ExperimentRepository, TrialRepository,
};
use crate::services::{CallbackIngress, ExperimentEngine, SubmissionService};

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub ingress: Arc<CallbackIngress>,
    pub engine: Arc<ExperimentEngine>,
    pub champions: Arc<dyn ChampionRepository>,
    pub trials: Arc<dyn TrialRepository>,
    pub experiments: Arc<dyn ExperimentRepository>,
    /// Runs used when a create request omits `target_runs`
    pub default_target_runs: u32,
}

/// Build the API router.
pub fn build_router(state: Arc<AppState>, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Trials
        .route("/affirmation", post(submit_affirmation))
        .route("/webhook/verdict", post(receive_verdict))
        .route("/webhook/ferret-reaction", post(receive_verdict))
        .route("/trials/history", get(trial_history))
        .route("/affirmations/history", get(trial_history))
        .route("/trials/{id}", get(get_trial))
        .route("/champion", get(get_champion))
        // Experiments
        .route("/experiments", post(create_experiment).get(list_experiments))
        .route("/experiments/{id}", get(get_experiment))
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Judging API server.
pub struct FerretsHttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl FerretsHttpServer {
    pub fn new(state: Arc<AppState>, config: ServerConfig) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), self.config.enable_cors)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: WELCOME_MESSAGE.to_string(),
        timestamp: Utc::now(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

async fn submit_affirmation(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<AffirmationResponse>)> {
    let submission = state.submissions.submit().await.map_err(|e| domain_error(&e))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AffirmationResponse {
            trial_id: submission.trial_id,
            phrase: submission.phrase,
            message: SUBMITTED_MESSAGE.to_string(),
        }),
    ))
}

async fn receive_verdict(
    State(state): State<Arc<AppState>>,
    Json(callback): Json<VerdictCallback>,
) -> Json<VerdictAck> {
    match callback.event() {
        Some(event) => {
            state.ingress.receive(event).await;
        }
        None => {
            tracing::warn!(trial_id = %callback.trial_id, "verdict for unrecognised trial id ignored");
        }
    }
    Json(VerdictAck {
        status: "received".to_string(),
        trial_id: callback.trial_id,
    })
}

async fn trial_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<Trial>>> {
    let limit = params.limit.min(MAX_PAGE_SIZE);
    let trials = state.trials.list_recent(limit).await.map_err(|e| domain_error(&e))?;
    Ok(Json(trials))
}

async fn get_trial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Trial>> {
    match state.trials.get(id).await {
        Ok(Some(trial)) => Ok(Json(trial)),
        Ok(None) => Err(domain_error(&DomainError::TrialNotFound(id))),
        Err(e) => Err(domain_error(&e)),
    }
}

async fn get_champion(State(state): State<Arc<AppState>>) -> ApiResult<Json<ChampionPhrase>> {
    let champion = state.champions.get().await.map_err(|e| domain_error(&e))?;
    Ok(Json(champion))
}

async fn create_experiment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateExperimentRequest>,
) -> ApiResult<(StatusCode, Json<ExperimentResponse>)> {
    let target_runs = req.target_runs.unwrap_or(state.default_target_runs);
    let experiment = state
        .engine
        .start(&req.name, &req.variant_b_phrase, target_runs)
        .await
        .map_err(|e| domain_error(&e))?;
    Ok((StatusCode::CREATED, Json(ExperimentResponse::from(experiment))))
}

async fn list_experiments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExperimentQueryParams>,
) -> ApiResult<Json<Vec<ExperimentResponse>>> {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(ExperimentStatus::from_str(s).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Unknown experiment status: {s}"),
                "VALIDATION_ERROR",
            )
        })?),
    };
    let filter = ExperimentFilter {
        status,
        limit: params.limit.map(|l| l.min(MAX_PAGE_SIZE)),
    };

    let experiments = state.experiments.list(filter).await.map_err(|e| domain_error(&e))?;
    Ok(Json(experiments.into_iter().map(ExperimentResponse::from).collect()))
}

async fn get_experiment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExperimentResponse>> {
    match state.experiments.get(id).await {
        Ok(Some(experiment)) => Ok(Json(ExperimentResponse::from(experiment))),
        Ok(None) => Err(domain_error(&DomainError::ExperimentNotFound(id))),
        Err(e) => Err(domain_error(&e)),
    }
}
