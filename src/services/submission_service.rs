//! Single-phrase submission.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Trial;
use crate::domain::ports::{ChampionRepository, TrialRepository};
use crate::services::trial_runner::TrialRunner;

/// Acknowledgement for a dispatched trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub trial_id: Uuid,
    pub phrase: String,
}

/// Submits the current champion phrase to the judge.
pub struct SubmissionService {
    champions: Arc<dyn ChampionRepository>,
    ledger: Arc<dyn TrialRepository>,
    runner: Arc<TrialRunner>,
}

impl SubmissionService {
    pub fn new(
        champions: Arc<dyn ChampionRepository>,
        ledger: Arc<dyn TrialRepository>,
        runner: Arc<TrialRunner>,
    ) -> Self {
        Self {
            champions,
            ledger,
            runner,
        }
    }

    /// Record a pending trial for the champion phrase and dispatch it.
    ///
    /// Returns as soon as the trial is stored; the verdict arrives later
    /// through the callback ingress.
    pub async fn submit(&self) -> DomainResult<Submission> {
        let champion = self.champions.get().await?;
        let trial = Trial::new(champion.phrase);
        self.ledger.create(&trial).await?;

        self.runner.spawn(trial.id, trial.phrase.clone());
        tracing::info!(trial_id = %trial.id, phrase = %trial.phrase, "affirmation submitted");

        Ok(Submission {
            trial_id: trial.id,
            phrase: trial.phrase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteChampionRepository, SqliteTrialRepository,
    };
    use crate::domain::models::{TrialStatus, DEFAULT_CHAMPION_PHRASE};
    use crate::domain::ports::{JudgeClient, JudgeError};
    use crate::services::callback_ingress::CallbackIngress;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Pleased;

    #[async_trait]
    impl JudgeClient for Pleased {
        async fn judge(&self, _phrase: &str) -> Result<bool, JudgeError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_submit_uses_champion_and_resolves() {
        let pool = create_migrated_test_pool().await.unwrap();
        let champions = Arc::new(SqliteChampionRepository::new(pool.clone()));
        champions.seed(DEFAULT_CHAMPION_PHRASE).await.unwrap();
        let ledger = Arc::new(SqliteTrialRepository::new(pool));
        let ingress = Arc::new(CallbackIngress::new(ledger.clone()));
        let runner = Arc::new(TrialRunner::new(
            Arc::new(Pleased),
            ingress,
            ledger.clone(),
            Duration::ZERO,
        ));
        let service = SubmissionService::new(champions, ledger.clone(), runner);

        let submission = service.submit().await.unwrap();
        assert_eq!(submission.phrase, DEFAULT_CHAMPION_PHRASE);

        let mut resolved = None;
        for _ in 0..100 {
            let trial = ledger.get(submission.trial_id).await.unwrap().unwrap();
            if trial.status != TrialStatus::Pending {
                resolved = Some(trial);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let trial = resolved.expect("trial should settle");
        assert_eq!(trial.status, TrialStatus::Resolved);
        assert_eq!(trial.verdict, Some(true));
        assert!(trial.experiment_id.is_none());
    }

    #[tokio::test]
    async fn test_submit_without_champion_fails() {
        let pool = create_migrated_test_pool().await.unwrap();
        let ledger = Arc::new(SqliteTrialRepository::new(pool.clone()));
        let runner = Arc::new(TrialRunner::new(
            Arc::new(Pleased),
            Arc::new(CallbackIngress::new(ledger.clone())),
            ledger.clone(),
            Duration::ZERO,
        ));
        let service = SubmissionService::new(
            Arc::new(SqliteChampionRepository::new(pool)),
            ledger.clone(),
            runner,
        );

        assert!(service.submit().await.is_err());
        assert!(ledger.list_recent(10).await.unwrap().is_empty());
    }
}
