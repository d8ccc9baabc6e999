//! Implementation of the `fickle-ferrets history` command.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::client::ApiClient;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Trial, TrialStatus};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of trials to display
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct HistoryOutput(pub Vec<Trial>);

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "phrase", "status", "joy", "experiment", "created"]);
        for trial in &self.0 {
            let joy = match (trial.status, trial.verdict) {
                (TrialStatus::Resolved, Some(true)) => "yes",
                (TrialStatus::Resolved, _) => "no",
                _ => "-",
            };
            let experiment = trial
                .experiment_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()[..8].to_string());
            table.add_row(vec![
                Cell::new(&trial.id.to_string()[..8]),
                Cell::new(truncate(&trial.phrase, 40)),
                Cell::new(trial.status.as_str()),
                Cell::new(joy),
                Cell::new(experiment),
                Cell::new(trial.created_at.format("%Y-%m-%d %H:%M:%S")),
            ]);
        }
        render_list("trial", &table, self.0.len())
    }
}

pub async fn execute(args: HistoryArgs, client: &ApiClient, json_mode: bool) -> Result<()> {
    let trials = client.trial_history(args.limit).await?;
    output(&HistoryOutput(trials), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_table_lists_trials() {
        let mut resolved = Trial::new("You are a delight");
        resolved.status = TrialStatus::Resolved;
        resolved.verdict = Some(true);
        let pending = Trial::new("Whoosa good ferret!");

        let rendered = HistoryOutput(vec![resolved, pending]).to_human();
        assert!(rendered.starts_with("2 trials:"));
        assert!(rendered.contains("You are a delight"));
        assert!(rendered.contains("pending"));
        assert!(rendered.contains("yes"));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(HistoryOutput(Vec::new()).to_human(), "No trials found.");
    }
}
