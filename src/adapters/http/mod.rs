//! HTTP adapter: axum router, handlers and wire types.

pub mod server;
pub mod types;

pub use server::{build_router, AppState, FerretsHttpServer};
pub use types::{
    AffirmationResponse, CreateExperimentRequest, ErrorResponse, ExperimentResponse,
    HealthResponse, MessageResponse, ResultsResponse, VerdictAck, VerdictCallback,
};
