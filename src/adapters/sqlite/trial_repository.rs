//! SQLite implementation of the trial ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResolveOutcome, Trial, TrialStatus};
use crate::domain::ports::TrialRepository;

const TRIAL_COLUMNS: &str =
    "id, phrase, status, verdict, created_at, resolved_at, experiment_id, failure_reason";

#[derive(Clone)]
pub struct SqliteTrialRepository {
    pool: SqlitePool,
}

impl SqliteTrialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Distinguish "already settled" from "unknown" after a conditional update touched nothing.
    async fn outcome_for_untouched(&self, id: Uuid) -> DomainResult<ResolveOutcome> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT status FROM trials WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(if exists.is_some() {
            ResolveOutcome::AlreadySettled
        } else {
            ResolveOutcome::Unknown
        })
    }
}

#[async_trait]
impl TrialRepository for SqliteTrialRepository {
    async fn create(&self, trial: &Trial) -> DomainResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO trials (id, phrase, status, verdict, created_at, resolved_at, experiment_id, failure_reason)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(trial.id.to_string())
        .bind(&trial.phrase)
        .bind(trial.status.as_str())
        .bind(trial.verdict)
        .bind(format_datetime(&trial.created_at))
        .bind(trial.resolved_at.as_ref().map(format_datetime))
        .bind(trial.experiment_id.map(|id| id.to_string()))
        .bind(&trial.failure_reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DomainError::DuplicateTrial(trial.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Trial>> {
        let row: Option<TrialRow> = sqlx::query_as(&format!("SELECT {TRIAL_COLUMNS} FROM trials WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn resolve(&self, id: Uuid, verdict: bool, at: DateTime<Utc>) -> DomainResult<ResolveOutcome> {
        let result = sqlx::query(
            "UPDATE trials SET status = 'resolved', verdict = ?, resolved_at = ? WHERE id = ? AND status = 'pending'"
        )
        .bind(verdict)
        .bind(format_datetime(&at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.outcome_for_untouched(id).await;
        }
        Ok(ResolveOutcome::Settled)
    }

    async fn mark_failed(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> DomainResult<ResolveOutcome> {
        let result = sqlx::query(
            "UPDATE trials SET status = 'failed', failure_reason = ?, resolved_at = ? WHERE id = ? AND status = 'pending'"
        )
        .bind(reason)
        .bind(format_datetime(&at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.outcome_for_untouched(id).await;
        }
        Ok(ResolveOutcome::Settled)
    }

    async fn fail_pending_for_experiment(
        &self,
        experiment_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE trials SET status = 'failed', failure_reason = ?, resolved_at = ? WHERE experiment_id = ? AND status = 'pending'"
        )
        .bind(reason)
        .bind(format_datetime(&at))
        .bind(experiment_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_by_experiment(&self, experiment_id: Uuid) -> DomainResult<Vec<Trial>> {
        let rows: Vec<TrialRow> = sqlx::query_as(&format!("SELECT {TRIAL_COLUMNS} FROM trials WHERE experiment_id = ?"))
            .bind(experiment_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<Trial>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<TrialRow> = sqlx::query_as(&format!(
            "SELECT {TRIAL_COLUMNS} FROM trials ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TrialRow {
    id: String,
    phrase: String,
    status: String,
    verdict: Option<bool>,
    created_at: String,
    resolved_at: Option<String>,
    experiment_id: Option<String>,
    failure_reason: Option<String>,
}

impl TryFrom<TrialRow> for Trial {
    type Error = DomainError;

    fn try_from(row: TrialRow) -> Result<Self, Self::Error> {
        let status = TrialStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid trial status: {}", row.status)))?;

        Ok(Trial {
            id: parse_uuid(&row.id)?,
            phrase: row.phrase,
            status,
            verdict: row.verdict,
            created_at: parse_datetime(&row.created_at)?,
            resolved_at: parse_optional_datetime(row.resolved_at)?,
            experiment_id: parse_optional_uuid(row.experiment_id)?,
            failure_reason: row.failure_reason,
        })
    }
}
