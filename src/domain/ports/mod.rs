//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - TrialRepository: the trial ledger
//! - ExperimentRepository: experiment records
//! - ChampionRepository: the champion phrase singleton
//! - JudgeClient: the external scoring service
//! - VerdictSink: where trial runners deliver verdicts

pub mod champion_repository;
pub mod experiment_repository;
pub mod judge_client;
pub mod trial_repository;
pub mod verdict_sink;

pub use champion_repository::ChampionRepository;
pub use experiment_repository::{ExperimentFilter, ExperimentRepository};
pub use judge_client::{JudgeClient, JudgeError};
pub use trial_repository::TrialRepository;
pub use verdict_sink::{DeliveryError, VerdictSink};
