//! Service wiring from a loaded [`Config`].

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::http::AppState;
use crate::adapters::sqlite::{
    initialize_database, PoolConfig, SqliteChampionRepository, SqliteExperimentRepository,
    SqliteTrialRepository,
};
use crate::domain::models::Config;
use crate::domain::ports::{
    ChampionRepository, ExperimentRepository, JudgeClient, TrialRepository, VerdictSink,
};
use crate::infrastructure::judge::{HttpJudgeClient, JudgeClientConfig, WebhookVerdictSink};
use crate::services::{
    CallbackIngress, CoinFlip, EngineConfig, ExperimentEngine, SubmissionService, TrialRunner,
    VariantPicker,
};

/// Every service of a running instance, sharing one database pool.
pub struct App {
    pub config: Config,
    pub pool: SqlitePool,
    pub champions: Arc<dyn ChampionRepository>,
    pub trials: Arc<dyn TrialRepository>,
    pub experiments: Arc<dyn ExperimentRepository>,
    pub ingress: Arc<CallbackIngress>,
    pub runner: Arc<TrialRunner>,
    pub submissions: Arc<SubmissionService>,
    pub engine: Arc<ExperimentEngine>,
}

impl App {
    /// Open the configured database and talk to the configured judge.
    pub async fn from_config(config: Config) -> Result<Self> {
        let pool_config = PoolConfig::from(&config.database);
        let pool = initialize_database(&config.database.url(), Some(pool_config))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let judge = HttpJudgeClient::with_config(JudgeClientConfig::from(&config.judge))?;

        Self::assemble(config, pool, Arc::new(judge), Arc::new(CoinFlip)).await
    }

    /// Wire services over an already migrated pool.
    ///
    /// Seeds the champion phrase if the store is empty.
    pub async fn assemble(
        config: Config,
        pool: SqlitePool,
        judge: Arc<dyn JudgeClient>,
        picker: Arc<dyn VariantPicker>,
    ) -> Result<Self> {
        let champions: Arc<dyn ChampionRepository> =
            Arc::new(SqliteChampionRepository::new(pool.clone()));
        let trials: Arc<dyn TrialRepository> = Arc::new(SqliteTrialRepository::new(pool.clone()));
        let experiments: Arc<dyn ExperimentRepository> =
            Arc::new(SqliteExperimentRepository::new(pool.clone()));

        champions
            .seed(&config.champion.seed_phrase)
            .await
            .context("Failed to seed champion phrase")?;

        let ingress = Arc::new(CallbackIngress::new(Arc::clone(&trials)));
        let sink: Arc<dyn VerdictSink> = match &config.judge.callback_url {
            Some(url) => {
                tracing::info!(callback_url = %url, "verdicts delivered over webhook");
                Arc::new(WebhookVerdictSink::new(
                    url.clone(),
                    Duration::from_secs(config.judge.timeout_secs),
                )?)
            }
            None => ingress.clone(),
        };

        let runner = Arc::new(TrialRunner::new(
            judge,
            sink,
            Arc::clone(&trials),
            Duration::from_millis(config.judge.thinking_delay_ms),
        ));
        let submissions = Arc::new(SubmissionService::new(
            Arc::clone(&champions),
            Arc::clone(&trials),
            Arc::clone(&runner),
        ));
        let engine = Arc::new(
            ExperimentEngine::new(
                Arc::clone(&experiments),
                Arc::clone(&trials),
                Arc::clone(&champions),
                Arc::clone(&runner),
                EngineConfig::from(&config.experiment),
            )
            .with_picker(picker),
        );

        Ok(Self {
            config,
            pool,
            champions,
            trials,
            experiments,
            ingress,
            runner,
            submissions,
            engine,
        })
    }

    /// Handler state for the HTTP router.
    pub fn http_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            submissions: Arc::clone(&self.submissions),
            ingress: Arc::clone(&self.ingress),
            engine: Arc::clone(&self.engine),
            champions: Arc::clone(&self.champions),
            trials: Arc::clone(&self.trials),
            experiments: Arc::clone(&self.experiments),
            default_target_runs: self.config.experiment.default_target_runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::ports::JudgeError;
    use async_trait::async_trait;

    struct Unimpressed;

    #[async_trait]
    impl JudgeClient for Unimpressed {
        async fn judge(&self, _phrase: &str) -> Result<bool, JudgeError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_assemble_seeds_configured_champion() {
        let mut config = Config::default();
        config.champion.seed_phrase = "Ferrets are the finest".to_string();
        let pool = create_migrated_test_pool().await.unwrap();

        let app = App::assemble(config, pool, Arc::new(Unimpressed), Arc::new(CoinFlip))
            .await
            .unwrap();

        let champion = app.champions.get().await.unwrap();
        assert_eq!(champion.phrase, "Ferrets are the finest");
        assert_eq!(app.http_state().default_target_runs, 100);
    }

    #[tokio::test]
    async fn test_from_config_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("nested/ferrets.db").display().to_string();

        let app = App::from_config(config).await.unwrap();
        assert!(dir.path().join("nested/ferrets.db").exists());
        assert_eq!(app.champions.get().await.unwrap().phrase, "Whoosa good ferret!");
    }
}
