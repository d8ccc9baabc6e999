//! Implementation of the `fickle-ferrets champion` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::client::ApiClient;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ChampionPhrase;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ChampionOutput(pub ChampionPhrase);

impl CommandOutput for ChampionOutput {
    fn to_human(&self) -> String {
        format!(
            "Champion phrase: \"{}\"\n  Updated at: {}",
            self.0.phrase,
            self.0.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

pub async fn execute(client: &ApiClient, json_mode: bool) -> Result<()> {
    let champion = client.champion().await?;
    output(&ChampionOutput(champion), json_mode);
    Ok(())
}
