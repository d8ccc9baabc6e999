//! SQLite implementation of the champion store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ChampionPhrase;
use crate::domain::ports::ChampionRepository;

/// Row id of the singleton champion record.
pub(crate) const CHAMPION_ID: i64 = 1;

#[derive(Clone)]
pub struct SqliteChampionRepository {
    pool: SqlitePool,
}

impl SqliteChampionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChampionRepository for SqliteChampionRepository {
    async fn seed(&self, phrase: &str) -> DomainResult<ChampionPhrase> {
        let result = sqlx::query("INSERT OR IGNORE INTO champion_phrase (id, phrase, updated_at) VALUES (?, ?, ?)")
            .bind(CHAMPION_ID)
            .bind(phrase)
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool)
            .await?;

        let champion = self.get().await?;
        if result.rows_affected() == 1 {
            tracing::info!(phrase = %champion.phrase, "seeded champion phrase");
        } else {
            tracing::info!(phrase = %champion.phrase, "champion phrase loaded");
        }
        Ok(champion)
    }

    async fn get(&self) -> DomainResult<ChampionPhrase> {
        let row: Option<(String, String)> = sqlx::query_as("SELECT phrase, updated_at FROM champion_phrase WHERE id = ?")
            .bind(CHAMPION_ID)
            .fetch_optional(&self.pool)
            .await?;

        let (phrase, updated_at) = row.ok_or(DomainError::ChampionMissing)?;
        Ok(ChampionPhrase {
            phrase,
            updated_at: parse_datetime(&updated_at)?,
        })
    }

    async fn set(&self, phrase: &str) -> DomainResult<ChampionPhrase> {
        let champion = ChampionPhrase::new(phrase);
        let result = sqlx::query("UPDATE champion_phrase SET phrase = ?, updated_at = ? WHERE id = ?")
            .bind(&champion.phrase)
            .bind(format_datetime(&champion.updated_at))
            .bind(CHAMPION_ID)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ChampionMissing);
        }
        Ok(champion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteChampionRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteChampionRepository::new(pool)
    }

    #[tokio::test]
    async fn test_get_before_seed_fails() {
        let repo = setup_test_repo().await;
        assert!(matches!(repo.get().await, Err(DomainError::ChampionMissing)));
        assert!(matches!(repo.set("x").await, Err(DomainError::ChampionMissing)));
    }

    #[tokio::test]
    async fn test_seed_is_insert_if_missing() {
        let repo = setup_test_repo().await;
        let seeded = repo.seed("Whoosa good ferret!").await.unwrap();
        assert_eq!(seeded.phrase, "Whoosa good ferret!");

        let reseeded = repo.seed("Something else").await.unwrap();
        assert_eq!(reseeded.phrase, "Whoosa good ferret!");
    }

    #[tokio::test]
    async fn test_set_replaces_phrase_and_stamps_time() {
        let repo = setup_test_repo().await;
        let seeded = repo.seed("old").await.unwrap();

        let updated = repo.set("new").await.unwrap();
        assert_eq!(updated.phrase, "new");
        assert!(updated.updated_at >= seeded.updated_at);
        assert_eq!(repo.get().await.unwrap().phrase, "new");
    }
}
