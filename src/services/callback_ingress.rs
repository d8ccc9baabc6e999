//! Callback ingress: routes verdict events into the trial ledger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::models::{ResolveOutcome, VerdictEvent};
use crate::domain::ports::{DeliveryError, TrialRepository, VerdictSink};

/// Receives verdicts for trials, whether delivered in-process or over the webhook.
///
/// Settling is monotonic: the first verdict for a trial wins and later
/// duplicates leave the record untouched.
pub struct CallbackIngress {
    ledger: Arc<dyn TrialRepository>,
}

impl CallbackIngress {
    pub fn new(ledger: Arc<dyn TrialRepository>) -> Self {
        Self { ledger }
    }

    /// Resolve the trial named by `event`. Never fails; storage errors are
    /// logged and reported as [`ResolveOutcome::Unknown`].
    pub async fn receive(&self, event: VerdictEvent) -> ResolveOutcome {
        let trial_id = event.trial_id;
        match self.ledger.resolve(trial_id, event.verdict, Utc::now()).await {
            Ok(ResolveOutcome::Settled) => {
                tracing::info!(%trial_id, verdict = event.verdict, "trial resolved");
                ResolveOutcome::Settled
            }
            Ok(ResolveOutcome::AlreadySettled) => {
                tracing::warn!(%trial_id, verdict = event.verdict, "duplicate verdict ignored");
                ResolveOutcome::AlreadySettled
            }
            Ok(ResolveOutcome::Unknown) => {
                tracing::warn!(%trial_id, "verdict for unknown trial ignored");
                ResolveOutcome::Unknown
            }
            Err(e) => {
                tracing::error!(%trial_id, error = %e, "failed to record verdict");
                ResolveOutcome::Unknown
            }
        }
    }
}

#[async_trait]
impl VerdictSink for CallbackIngress {
    async fn deliver(&self, event: VerdictEvent) -> Result<(), DeliveryError> {
        self.receive(event).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteTrialRepository};
    use crate::domain::models::{Trial, TrialStatus};
    use uuid::Uuid;

    async fn setup() -> (CallbackIngress, Arc<SqliteTrialRepository>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let ledger = Arc::new(SqliteTrialRepository::new(pool));
        (CallbackIngress::new(ledger.clone()), ledger)
    }

    #[tokio::test]
    async fn test_first_verdict_wins() {
        let (ingress, ledger) = setup().await;
        let trial = Trial::new("You light up the room");
        ledger.create(&trial).await.unwrap();

        assert_eq!(
            ingress.receive(VerdictEvent::new(trial.id, true)).await,
            ResolveOutcome::Settled
        );
        assert_eq!(
            ingress.receive(VerdictEvent::new(trial.id, false)).await,
            ResolveOutcome::AlreadySettled
        );

        let stored = ledger.get(trial.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TrialStatus::Resolved);
        assert_eq!(stored.verdict, Some(true));
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_trial_is_a_no_op() {
        let (ingress, _ledger) = setup().await;
        assert_eq!(
            ingress.receive(VerdictEvent::new(Uuid::new_v4(), true)).await,
            ResolveOutcome::Unknown
        );
    }

    #[tokio::test]
    async fn test_deliver_never_fails() {
        let (ingress, _ledger) = setup().await;
        assert!(ingress.deliver(VerdictEvent::new(Uuid::new_v4(), false)).await.is_ok());
    }
}
