//! Trial runner: one judge call per trial, delivered as a verdict event.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::models::VerdictEvent;
use crate::domain::ports::{DeliveryError, JudgeClient, JudgeError, TrialRepository, VerdictSink};

/// Why a trial produced no verdict.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Runs single trials: judge, think, deliver.
///
/// Failures are never retried. The trial is marked `failed` in the ledger
/// with the error text so that it is excluded from any tally.
pub struct TrialRunner {
    judge: Arc<dyn JudgeClient>,
    sink: Arc<dyn VerdictSink>,
    ledger: Arc<dyn TrialRepository>,
    thinking_delay: Duration,
}

impl TrialRunner {
    pub fn new(
        judge: Arc<dyn JudgeClient>,
        sink: Arc<dyn VerdictSink>,
        ledger: Arc<dyn TrialRepository>,
        thinking_delay: Duration,
    ) -> Self {
        Self {
            judge,
            sink,
            ledger,
            thinking_delay,
        }
    }

    /// Judge `phrase` for an existing trial and deliver the verdict.
    pub async fn run(&self, trial_id: Uuid, phrase: &str) -> Result<bool, TrialError> {
        match self.judge_and_deliver(trial_id, phrase).await {
            Ok(verdict) => {
                tracing::debug!(%trial_id, verdict, "verdict delivered");
                Ok(verdict)
            }
            Err(err) => {
                tracing::warn!(%trial_id, error = %err, "trial failed");
                self.record_failure(trial_id, &err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Fire-and-forget form of [`run`](Self::run). Failures are logged by `run`.
    pub fn spawn(self: &Arc<Self>, trial_id: Uuid, phrase: String) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let _ = runner.run(trial_id, &phrase).await;
        })
    }

    async fn judge_and_deliver(&self, trial_id: Uuid, phrase: &str) -> Result<bool, TrialError> {
        let verdict = self.judge.judge(phrase).await?;

        let delay = self.sample_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.sink.deliver(VerdictEvent::new(trial_id, verdict)).await?;
        Ok(verdict)
    }

    /// Uniform in `[0, thinking_delay)`.
    fn sample_delay(&self) -> Duration {
        let max_ms = u64::try_from(self.thinking_delay.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }

    async fn record_failure(&self, trial_id: Uuid, reason: &str) {
        if let Err(e) = self.ledger.mark_failed(trial_id, reason, Utc::now()).await {
            tracing::error!(%trial_id, error = %e, "could not mark trial failed");
        }
    }
}
