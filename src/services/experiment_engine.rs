//! Experiment engine: champion vs. challenger A/B runs.
//!
//! Lifecycle of one experiment:
//!
//! 1. [`ExperimentEngine::create`] snapshots the champion as variant A and
//!    persists an `active` record. Only one experiment may be active.
//! 2. [`ExperimentEngine::execute`] dispatches `target_runs` trials, each
//!    assigned a variant by the [`VariantPicker`], and waits on a barrier
//!    for every dispatched trial task (bounded by the barrier timeout).
//! 3. [`ExperimentEngine::complete`] tallies resolved trials, picks the
//!    winner and promotes its phrase to champion.
//!
//! [`ExperimentEngine::start`] runs all three, with 2 and 3 on a detached task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Experiment, ExperimentConfig, ExperimentResults, Trial, Variant};
use crate::domain::ports::{ChampionRepository, ExperimentRepository, TrialRepository};
use crate::services::trial_runner::TrialRunner;

/// Assigns a variant to each dispatched trial.
pub trait VariantPicker: Send + Sync {
    fn pick(&self) -> Variant;
}

/// Unbiased coin flip.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoinFlip;

impl VariantPicker for CoinFlip {
    fn pick(&self) -> Variant {
        if rand::random::<bool>() {
            Variant::A
        } else {
            Variant::B
        }
    }
}

/// Always picks the same variant.
#[derive(Debug, Clone, Copy)]
pub struct FixedVariant(pub Variant);

impl VariantPicker for FixedVariant {
    fn pick(&self) -> Variant {
        self.0
    }
}

/// Engine limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Largest accepted `target_runs`
    pub max_target_runs: u32,
    /// Trial tasks allowed to run at once
    pub max_in_flight: usize,
    /// Bound on the wait for all dispatched trials
    pub barrier_timeout: Duration,
    /// Wait between the barrier and the sweep of pending trials
    pub settle_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&ExperimentConfig::default())
    }
}

impl From<&ExperimentConfig> for EngineConfig {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            max_target_runs: config.max_target_runs,
            max_in_flight: config.max_in_flight.max(1),
            barrier_timeout: Duration::from_secs(config.barrier_timeout_secs),
            settle_grace: Duration::from_millis(config.settle_grace_ms),
        }
    }
}

/// What happened at the barrier of one `execute` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BarrierReport {
    /// Trial tasks spawned
    pub launched: usize,
    /// Trial tasks that ran to the end
    pub finished: usize,
    /// Trial tasks cancelled by the barrier timeout
    pub aborted: usize,
    /// Trials still pending after the barrier, now marked failed
    pub swept: u64,
    pub timed_out: bool,
}

pub struct ExperimentEngine {
    experiments: Arc<dyn ExperimentRepository>,
    ledger: Arc<dyn TrialRepository>,
    champions: Arc<dyn ChampionRepository>,
    runner: Arc<TrialRunner>,
    picker: Arc<dyn VariantPicker>,
    config: EngineConfig,
    creation_lock: Mutex<()>,
}

impl ExperimentEngine {
    pub fn new(
        experiments: Arc<dyn ExperimentRepository>,
        ledger: Arc<dyn TrialRepository>,
        champions: Arc<dyn ChampionRepository>,
        runner: Arc<TrialRunner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            experiments,
            ledger,
            champions,
            runner,
            picker: Arc::new(CoinFlip),
            config,
            creation_lock: Mutex::new(()),
        }
    }

    /// Replace the variant picker.
    pub fn with_picker(mut self, picker: Arc<dyn VariantPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create an active experiment pitting the champion against `variant_b_phrase`.
    pub async fn create(
        &self,
        name: &str,
        variant_b_phrase: &str,
        target_runs: u32,
    ) -> DomainResult<Experiment> {
        if target_runs > self.config.max_target_runs {
            return Err(DomainError::ValidationFailed(format!(
                "target_runs must be at most {}",
                self.config.max_target_runs
            )));
        }

        let _guard = self.creation_lock.lock().await;

        if let Some(active) = self.experiments.get_active().await? {
            return Err(DomainError::ExperimentConflict {
                active_id: active.id.to_string(),
            });
        }

        let champion = self.champions.get().await?;
        let experiment = Experiment::new(name, champion.phrase, variant_b_phrase, target_runs);
        experiment.validate().map_err(DomainError::ValidationFailed)?;

        self.experiments.create(&experiment).await?;

        tracing::info!(
            experiment_id = %experiment.id,
            name = %experiment.name,
            variant_a = %experiment.variant_a_phrase,
            variant_b = %experiment.variant_b_phrase,
            target_runs,
            "experiment created"
        );
        Ok(experiment)
    }

    /// Create an experiment and run it to completion in the background.
    pub async fn start(
        self: &Arc<Self>,
        name: &str,
        variant_b_phrase: &str,
        target_runs: u32,
    ) -> DomainResult<Experiment> {
        let experiment = self.create(name, variant_b_phrase, target_runs).await?;

        let engine = Arc::clone(self);
        let id = experiment.id;
        tokio::spawn(async move {
            if let Err(e) = engine.run_to_completion(id).await {
                tracing::error!(experiment_id = %id, error = %e, "experiment did not complete");
            }
        });

        Ok(experiment)
    }

    /// Execute then complete. `complete` runs even when `execute` fails so the
    /// experiment never stays active.
    pub async fn run_to_completion(&self, id: Uuid) -> DomainResult<Experiment> {
        if let Err(e) = self.execute(id).await {
            tracing::error!(experiment_id = %id, error = %e, "experiment execution failed");
        }
        self.complete(id).await
    }

    /// Dispatch every trial of an active experiment and wait for them.
    ///
    /// Missing or completed experiments are skipped with a warning.
    pub async fn execute(&self, id: Uuid) -> DomainResult<BarrierReport> {
        let Some(experiment) = self.experiments.get(id).await? else {
            tracing::warn!(experiment_id = %id, "execute skipped: experiment not found");
            return Ok(BarrierReport::default());
        };
        if !experiment.is_active() {
            tracing::warn!(experiment_id = %id, status = experiment.status.as_str(), "execute skipped: experiment not active");
            return Ok(BarrierReport::default());
        }

        let permits = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut dispatch_error = None;

        for _ in 0..experiment.target_runs {
            let variant = self.picker.pick();
            let trial = Trial::new(experiment.phrase_for(variant)).for_experiment(id);
            if let Err(e) = self.ledger.create(&trial).await {
                dispatch_error = Some(e);
                break;
            }

            let runner = Arc::clone(&self.runner);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let _ = runner.run(trial.id, &trial.phrase).await;
            });
        }

        let mut report = BarrierReport {
            launched: tasks.len(),
            ..BarrierReport::default()
        };
        tracing::info!(experiment_id = %id, launched = report.launched, "trials dispatched");

        let finished = &mut report.finished;
        let waited = tokio::time::timeout(self.config.barrier_timeout, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(experiment_id = %id, error = %e, "trial task ended abnormally");
                }
                *finished += 1;
            }
        })
        .await;

        if waited.is_err() {
            report.timed_out = true;
            report.aborted = tasks.len();
            tasks.shutdown().await;
            tracing::warn!(
                experiment_id = %id,
                aborted = report.aborted,
                timeout_secs = self.config.barrier_timeout.as_secs(),
                "barrier timed out"
            );
        }

        if !self.config.settle_grace.is_zero() {
            tracing::debug!(
                experiment_id = %id,
                grace = ?self.config.settle_grace,
                "waiting for late verdicts"
            );
            tokio::time::sleep(self.config.settle_grace).await;
        }

        let reason = if report.timed_out {
            "barrier timed out before a verdict arrived"
        } else {
            "no verdict received"
        };
        report.swept = self
            .ledger
            .fail_pending_for_experiment(id, reason, Utc::now())
            .await?;

        tracing::info!(
            experiment_id = %id,
            finished = report.finished,
            aborted = report.aborted,
            swept = report.swept,
            "barrier released"
        );

        match dispatch_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Tally results, mark the experiment completed and promote the winner.
    ///
    /// Already-completed experiments are returned unchanged. Only the call
    /// whose update moves the record out of `active` promotes the champion,
    /// and a failed write leaves the experiment active so a retry can finish it.
    pub async fn complete(&self, id: Uuid) -> DomainResult<Experiment> {
        let mut experiment = self
            .experiments
            .get(id)
            .await?
            .ok_or(DomainError::ExperimentNotFound(id))?;

        if experiment.is_completed() {
            tracing::debug!(experiment_id = %id, "experiment already completed");
            return Ok(experiment);
        }

        let trials = self.ledger.list_by_experiment(id).await?;
        let results = tally(&experiment, &trials);
        experiment.complete(results)?;

        if self.experiments.complete_and_promote(&experiment).await? {
            let winning_phrase = experiment.phrase_for(results.winner);

            tracing::info!(
                experiment_id = %id,
                winner = results.winner.as_str(),
                variant_a_wins = results.variant_a_wins,
                variant_a_total = results.variant_a_total,
                variant_b_wins = results.variant_b_wins,
                variant_b_total = results.variant_b_total,
                champion = %winning_phrase,
                "experiment completed"
            );
        } else {
            tracing::debug!(experiment_id = %id, "experiment completed concurrently");
        }

        self.experiments
            .get(id)
            .await?
            .ok_or(DomainError::ExperimentNotFound(id))
    }
}

/// Count resolved trials per variant by exact phrase match.
///
/// Failed, pending and unmatched trials are left out of both sides.
pub fn tally(experiment: &Experiment, trials: &[Trial]) -> ExperimentResults {
    let (mut a_wins, mut a_total, mut b_wins, mut b_total) = (0u32, 0u32, 0u32, 0u32);

    for trial in trials.iter().filter(|t| t.is_resolved()) {
        let (wins, total) = match experiment.variant_of(&trial.phrase) {
            Some(Variant::A) => (&mut a_wins, &mut a_total),
            Some(Variant::B) => (&mut b_wins, &mut b_total),
            None => continue,
        };
        *total += 1;
        if trial.sparked_joy() {
            *wins += 1;
        }
    }

    ExperimentResults::from_tallies(a_wins, a_total, b_wins, b_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TrialStatus;

    fn resolved(phrase: &str, verdict: bool) -> Trial {
        let mut trial = Trial::new(phrase);
        trial.status = TrialStatus::Resolved;
        trial.verdict = Some(verdict);
        trial.resolved_at = Some(Utc::now());
        trial
    }

    #[test]
    fn test_tally_ignores_unresolved_and_unmatched() {
        let experiment = Experiment::new("t", "champ", "challenger", 6);
        let mut failed = Trial::new("champ");
        failed.status = TrialStatus::Failed;
        let trials = vec![
            resolved("champ", true),
            resolved("champ", false),
            resolved("challenger", true),
            resolved("stranger", true),
            failed,
            Trial::new("challenger"),
        ];

        let results = tally(&experiment, &trials);
        assert_eq!(results.variant_a_wins, 1);
        assert_eq!(results.variant_a_total, 2);
        assert_eq!(results.variant_b_wins, 1);
        assert_eq!(results.variant_b_total, 1);
        assert_eq!(results.winner, Variant::B);
    }

    #[test]
    fn test_tally_empty_goes_to_a() {
        let experiment = Experiment::new("t", "champ", "challenger", 3);
        let results = tally(&experiment, &[]);
        assert_eq!(results.winner, Variant::A);
        assert_eq!(results.counted_trials(), 0);
    }

    #[test]
    fn test_engine_config_from_experiment_config() {
        let config = EngineConfig::from(&ExperimentConfig {
            default_target_runs: 10,
            max_target_runs: 50,
            max_in_flight: 0,
            barrier_timeout_secs: 2,
            settle_grace_ms: 250,
        });
        assert_eq!(config.max_target_runs, 50);
        assert_eq!(config.max_in_flight, 1);
        assert_eq!(config.barrier_timeout, Duration::from_secs(2));
        assert_eq!(config.settle_grace, Duration::from_millis(250));
    }

    #[test]
    fn test_coin_flip_produces_both_variants() {
        let picker = CoinFlip;
        let picks: Vec<Variant> = (0..200).map(|_| picker.pick()).collect();
        assert!(picks.contains(&Variant::A));
        assert!(picks.contains(&Variant::B));
    }
}
