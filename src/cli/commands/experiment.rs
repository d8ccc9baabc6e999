//! Implementation of the `fickle-ferrets experiment` commands.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::adapters::http::{CreateExperimentRequest, ExperimentResponse};
use crate::cli::client::ApiClient;
use crate::cli::output::{format_rate, list_table, output, render_list, truncate, CommandOutput};
use crate::cli::ExperimentCommands;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Experiment name
    pub name: String,

    /// Challenger phrase (variant B)
    pub phrase: String,

    /// Number of trials (defaults to experiment.default_target_runs on the server)
    #[arg(short, long)]
    pub runs: Option<u32>,

    /// Wait for the experiment to complete
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait with --wait
    #[arg(long, default_value = "600")]
    pub timeout: u64,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (active, completed)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Maximum number of experiments to display
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Experiment ID
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ExperimentDetail(pub ExperimentResponse);

impl CommandOutput for ExperimentDetail {
    fn to_human(&self) -> String {
        let e = &self.0;
        let mut lines = vec![
            "Experiment Details:".to_string(),
            format!("  ID: {}", e.id),
            format!("  Name: {}", e.name),
            format!("  Status: {}", e.status),
            format!("  Variant A (champion): \"{}\"", e.variant_a_phrase),
            format!("  Variant B (challenger): \"{}\"", e.variant_b_phrase),
            format!("  Target runs: {}", e.target_runs),
            format!("  Created at: {}", e.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ];
        if let Some(completed_at) = e.completed_at {
            lines.push(format!(
                "  Completed at: {}",
                completed_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        if let Some(r) = &e.results {
            lines.push("\nResults:".to_string());
            lines.push(format!(
                "  Variant A: {}",
                format_rate(r.variant_a_wins, r.variant_a_total, r.variant_a_rate)
            ));
            lines.push(format!(
                "  Variant B: {}",
                format_rate(r.variant_b_wins, r.variant_b_total, r.variant_b_rate)
            ));
            lines.push(format!("  Winner: {} (\"{}\")", r.winner, r.winning_phrase));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ExperimentList(pub Vec<ExperimentResponse>);

impl CommandOutput for ExperimentList {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "status", "runs", "challenger", "winner"]);
        for e in &self.0 {
            let winner = e
                .results
                .as_ref()
                .map_or_else(|| "-".to_string(), |r| r.winner.clone());
            table.add_row(vec![
                Cell::new(&e.id.to_string()[..8]),
                Cell::new(truncate(&e.name, 24)),
                Cell::new(&e.status),
                Cell::new(e.target_runs),
                Cell::new(truncate(&e.variant_b_phrase, 32)),
                Cell::new(winner),
            ]);
        }
        render_list("experiment", &table, self.0.len())
    }
}

pub async fn execute(command: ExperimentCommands, client: &ApiClient, json_mode: bool) -> Result<()> {
    match command {
        ExperimentCommands::Start(args) => start(args, client, json_mode).await,
        ExperimentCommands::List(args) => {
            let experiments = client
                .list_experiments(args.status.as_deref(), args.limit)
                .await?;
            output(&ExperimentList(experiments), json_mode);
            Ok(())
        }
        ExperimentCommands::Show(args) => {
            let experiment = client.get_experiment(args.id).await?;
            output(&ExperimentDetail(experiment), json_mode);
            Ok(())
        }
    }
}

async fn start(args: StartArgs, client: &ApiClient, json_mode: bool) -> Result<()> {
    let request = CreateExperimentRequest {
        name: args.name,
        variant_b_phrase: args.phrase,
        target_runs: args.runs,
    };
    let mut experiment = client.create_experiment(&request).await?;

    if args.wait {
        let deadline = Instant::now() + Duration::from_secs(args.timeout);
        while experiment.results.is_none() && Instant::now() < deadline {
            tokio::time::sleep(POLL_INTERVAL).await;
            experiment = client.get_experiment(experiment.id).await?;
        }
    }

    output(&ExperimentDetail(experiment), json_mode);
    Ok(())
}
