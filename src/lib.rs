//! Fickle Ferrets - phrase judging with champion/challenger experiments
//!
//! The service hands a phrase to an external judge, receives a boolean
//! verdict asynchronously, and records the outcome. Experiments split a
//! fixed number of trials between the reigning champion phrase and a
//! challenger, then promote whichever sparked joy more often.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports services depend on
//! - **Service Layer** (`services`): trial runner, callback ingress, submission, experiment engine
//! - **Adapters** (`adapters`): SQLite repositories and the axum HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, judge HTTP client
//! - **Application Layer** (`application`): wiring services into a runnable instance
//! - **CLI Layer** (`cli`): `serve` plus HTTP client commands
//!
//! # Example
//!
//! ```ignore
//! use fickle_ferrets::{App, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_config(ConfigLoader::load()?).await?;
//!     let submission = app.submissions.submit().await?;
//!     println!("dispatched trial {}", submission.trial_id);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::App;
pub use domain::models::{
    ChampionPhrase, Config, Experiment, ExperimentResults, ExperimentStatus, Trial, TrialStatus,
    Variant, VerdictEvent,
};
pub use domain::ports::{
    ChampionRepository, ExperimentRepository, JudgeClient, JudgeError, TrialRepository,
    VerdictSink,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CallbackIngress, ExperimentEngine, SubmissionService, TrialRunner};
