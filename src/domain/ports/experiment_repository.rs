//! Experiment repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Experiment, ExperimentStatus};

/// Filter criteria for listing experiments.
#[derive(Debug, Clone, Default)]
pub struct ExperimentFilter {
    pub status: Option<ExperimentStatus>,
    pub limit: Option<usize>,
}

/// Repository interface for Experiment persistence.
#[async_trait]
pub trait ExperimentRepository: Send + Sync {
    /// Persist a new experiment. Fails with `ExperimentConflict` if another is active.
    async fn create(&self, experiment: &Experiment) -> DomainResult<()>;

    /// Get an experiment by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Experiment>>;

    /// The active experiment, if any.
    async fn get_active(&self) -> DomainResult<Option<Experiment>>;

    /// Store results and the completed status, and make the winning phrase the
    /// champion, as one atomic write. Applies only while the record is still active.
    ///
    /// Returns `false` when the stored experiment was already completed. On error
    /// neither the experiment nor the champion has changed.
    async fn complete_and_promote(&self, experiment: &Experiment) -> DomainResult<bool>;

    /// List experiments, newest first.
    async fn list(&self, filter: ExperimentFilter) -> DomainResult<Vec<Experiment>>;
}
