//! Trial ledger port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ResolveOutcome, Trial};

/// Durable, append-only record of trials keyed by trial id.
///
/// Every settle operation is a single conditional update on one record, so
/// callbacks may run concurrently with an experiment waiting on its trials.
#[async_trait]
pub trait TrialRepository: Send + Sync {
    /// Insert a new pending trial. Fails with `DuplicateTrial` if the id exists.
    async fn create(&self, trial: &Trial) -> DomainResult<()>;

    /// Get a trial by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Trial>>;

    /// Record the verdict of a pending trial.
    async fn resolve(&self, id: Uuid, verdict: bool, at: DateTime<Utc>) -> DomainResult<ResolveOutcome>;

    /// Mark a pending trial as failed.
    async fn mark_failed(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> DomainResult<ResolveOutcome>;

    /// Mark every still-pending trial of an experiment as failed. Returns how many changed.
    async fn fail_pending_for_experiment(
        &self,
        experiment_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// All trials tagged with an experiment, in no particular order.
    async fn list_by_experiment(&self, experiment_id: Uuid) -> DomainResult<Vec<Trial>>;

    /// Most recent trials first.
    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<Trial>>;
}
