//! Application services.

pub mod callback_ingress;
pub mod experiment_engine;
pub mod submission_service;
pub mod trial_runner;

pub use callback_ingress::CallbackIngress;
pub use experiment_engine::{
    tally, BarrierReport, CoinFlip, EngineConfig, ExperimentEngine, FixedVariant, VariantPicker,
};
pub use submission_service::{Submission, SubmissionService};
pub use trial_runner::{TrialError, TrialRunner};
