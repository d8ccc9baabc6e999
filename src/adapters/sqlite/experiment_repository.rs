//! SQLite implementation of the ExperimentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::champion_repository::CHAMPION_ID;
use super::{format_datetime, parse_count, parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Experiment, ExperimentResults, ExperimentStatus, Variant};
use crate::domain::ports::{ExperimentFilter, ExperimentRepository};

const EXPERIMENT_COLUMNS: &str = "id, name, variant_a_phrase, variant_b_phrase, status, target_runs, created_at, completed_at, winning_variant, variant_a_wins, variant_a_total, variant_b_wins, variant_b_total";

#[derive(Clone)]
pub struct SqliteExperimentRepository {
    pool: SqlitePool,
}

impl SqliteExperimentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn active_id(&self) -> DomainResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM experiments WHERE status = 'active' LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }
}

#[async_trait]
impl ExperimentRepository for SqliteExperimentRepository {
    async fn create(&self, experiment: &Experiment) -> DomainResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO experiments (id, name, variant_a_phrase, variant_b_phrase, status, target_runs, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(experiment.id.to_string())
        .bind(&experiment.name)
        .bind(&experiment.variant_a_phrase)
        .bind(&experiment.variant_b_phrase)
        .bind(experiment.status.as_str())
        .bind(i64::from(experiment.target_runs))
        .bind(format_datetime(&experiment.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The partial unique index on active status rejected the insert.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let active_id = self.active_id().await?.unwrap_or_else(|| "unknown".to_string());
                Err(DomainError::ExperimentConflict { active_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Experiment>> {
        let row: Option<ExperimentRow> = sqlx::query_as(&format!("SELECT {EXPERIMENT_COLUMNS} FROM experiments WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_active(&self) -> DomainResult<Option<Experiment>> {
        let row: Option<ExperimentRow> = sqlx::query_as(&format!(
            "SELECT {EXPERIMENT_COLUMNS} FROM experiments WHERE status = 'active' LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn complete_and_promote(&self, experiment: &Experiment) -> DomainResult<bool> {
        let results = experiment.results.ok_or_else(|| {
            DomainError::ValidationFailed(format!("experiment {} has no results to store", experiment.id))
        })?;
        let completed_at = experiment.completed_at.ok_or_else(|| {
            DomainError::ValidationFailed(format!("experiment {} has no completion time", experiment.id))
        })?;
        let winning_phrase = experiment.phrase_for(results.winner);

        // Dropping the transaction on any early return rolls both writes back.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE experiments SET status = 'completed', completed_at = ?, winning_variant = ?,
               variant_a_wins = ?, variant_a_total = ?, variant_b_wins = ?, variant_b_total = ?
               WHERE id = ? AND status = 'active'"#
        )
        .bind(format_datetime(&completed_at))
        .bind(results.winner.as_str())
        .bind(i64::from(results.variant_a_wins))
        .bind(i64::from(results.variant_a_total))
        .bind(i64::from(results.variant_b_wins))
        .bind(i64::from(results.variant_b_total))
        .bind(experiment.id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.get(experiment.id).await? {
                Some(_) => Ok(false),
                None => Err(DomainError::ExperimentNotFound(experiment.id)),
            };
        }

        let promoted = sqlx::query("UPDATE champion_phrase SET phrase = ?, updated_at = ? WHERE id = ?")
            .bind(winning_phrase)
            .bind(format_datetime(&completed_at))
            .bind(CHAMPION_ID)
            .execute(&mut *tx)
            .await?;

        if promoted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::ChampionMissing);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn list(&self, filter: ExperimentFilter) -> DomainResult<Vec<Experiment>> {
        let mut query = format!("SELECT {EXPERIMENT_COLUMNS} FROM experiments WHERE 1=1");

        if filter.status.is_some() {
            query.push_str(" AND status = ?");
        }
        query.push_str(" ORDER BY created_at DESC");
        if filter.limit.is_some() {
            query.push_str(" LIMIT ?");
        }

        let mut q = sqlx::query_as::<_, ExperimentRow>(&query);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(limit) = filter.limit {
            q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<ExperimentRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct ExperimentRow {
    id: String,
    name: String,
    variant_a_phrase: String,
    variant_b_phrase: String,
    status: String,
    target_runs: i64,
    created_at: String,
    completed_at: Option<String>,
    winning_variant: Option<String>,
    variant_a_wins: Option<i64>,
    variant_a_total: Option<i64>,
    variant_b_wins: Option<i64>,
    variant_b_total: Option<i64>,
}

impl TryFrom<ExperimentRow> for Experiment {
    type Error = DomainError;

    fn try_from(row: ExperimentRow) -> Result<Self, Self::Error> {
        let status = ExperimentStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid experiment status: {}", row.status)))?;

        let results = match row.winning_variant {
            Some(winner) => {
                let winner = Variant::from_str(&winner)
                    .ok_or_else(|| DomainError::SerializationError(format!("Invalid variant: {winner}")))?;
                Some(ExperimentResults {
                    winner,
                    variant_a_wins: parse_count(row.variant_a_wins, "variant_a_wins")?,
                    variant_a_total: parse_count(row.variant_a_total, "variant_a_total")?,
                    variant_b_wins: parse_count(row.variant_b_wins, "variant_b_wins")?,
                    variant_b_total: parse_count(row.variant_b_total, "variant_b_total")?,
                })
            }
            None => None,
        };

        Ok(Experiment {
            id: parse_uuid(&row.id)?,
            name: row.name,
            variant_a_phrase: row.variant_a_phrase,
            variant_b_phrase: row.variant_b_phrase,
            status,
            target_runs: parse_count(Some(row.target_runs), "target_runs")?,
            created_at: parse_datetime(&row.created_at)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            results,
        })
    }
}
