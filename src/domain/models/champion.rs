//! Champion phrase model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phrase seeded into an empty store.
pub const DEFAULT_CHAMPION_PHRASE: &str = "Whoosa good ferret!";

/// The currently favored phrase. Exactly one exists once the store is seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionPhrase {
    pub phrase: String,
    pub updated_at: DateTime<Utc>,
}

impl ChampionPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            updated_at: Utc::now(),
        }
    }
}
