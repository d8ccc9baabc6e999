//! Champion store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ChampionPhrase;

/// Singleton record holding the current champion phrase.
#[async_trait]
pub trait ChampionRepository: Send + Sync {
    /// Insert the phrase if no champion exists yet. Returns the stored champion.
    async fn seed(&self, phrase: &str) -> DomainResult<ChampionPhrase>;

    /// Current champion. Fails with `ChampionMissing` before seeding.
    async fn get(&self) -> DomainResult<ChampionPhrase>;

    /// Replace the champion phrase, stamping `updated_at`.
    async fn set(&self, phrase: &str) -> DomainResult<ChampionPhrase>;
}
