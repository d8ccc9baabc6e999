//! Common test utilities for integration tests
//!
//! Provides fake judges and an in-memory application fixture shared
//! across integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use fickle_ferrets::adapters::sqlite::create_migrated_test_pool;
use fickle_ferrets::domain::models::{Config, Experiment};
use fickle_ferrets::domain::ports::{ExperimentRepository, JudgeClient, JudgeError};
use fickle_ferrets::services::VariantPicker;
use fickle_ferrets::App;

/// Judge answering from a per-phrase table; unknown phrases are unimpressive.
pub struct ScriptedJudge {
    verdicts: HashMap<String, bool>,
    pub calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn new(verdicts: &[(&str, bool)]) -> Self {
        Self {
            verdicts: verdicts
                .iter()
                .map(|(phrase, verdict)| ((*phrase).to_string(), *verdict))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JudgeClient for ScriptedJudge {
    async fn judge(&self, phrase: &str) -> Result<bool, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdicts.get(phrase).copied().unwrap_or(false))
    }
}

/// Judge that fails every call with the given error.
pub struct FailingJudge(pub JudgeError);

#[async_trait]
impl JudgeClient for FailingJudge {
    async fn judge(&self, _phrase: &str) -> Result<bool, JudgeError> {
        Err(self.0.clone())
    }
}

/// Judge that never answers.
pub struct SilentJudge;

#[async_trait]
impl JudgeClient for SilentJudge {
    async fn judge(&self, _phrase: &str) -> Result<bool, JudgeError> {
        std::future::pending::<()>().await;
        Ok(false)
    }
}

/// Config suited to tests: no thinking delay, short barrier.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.judge.thinking_delay_ms = 0;
    config.experiment.barrier_timeout_secs = 5;
    config
}

/// Fully wired application over a fresh in-memory database.
pub async fn test_app(
    config: Config,
    judge: Arc<dyn JudgeClient>,
    picker: Arc<dyn VariantPicker>,
) -> App {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test pool");
    App::assemble(config, pool, judge, picker)
        .await
        .expect("Failed to assemble app")
}

/// Poll until the experiment is completed.
pub async fn wait_for_completion(app: &App, id: Uuid, timeout: Duration) -> Experiment {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let experiment = app
            .experiments
            .get(id)
            .await
            .expect("Failed to read experiment")
            .expect("Experiment should exist");
        if experiment.is_completed() {
            return experiment;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "experiment {id} did not complete in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Picker cycling through a fixed sequence.
pub struct SequencePicker {
    sequence: Vec<fickle_ferrets::Variant>,
    next: AtomicUsize,
}

impl SequencePicker {
    pub fn new(sequence: Vec<fickle_ferrets::Variant>) -> Self {
        Self {
            sequence,
            next: AtomicUsize::new(0),
        }
    }
}

impl VariantPicker for SequencePicker {
    fn pick(&self) -> fickle_ferrets::Variant {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.sequence[i % self.sequence.len()]
    }
}
