//! Implementation of the `fickle-ferrets affirm` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Trial, TrialStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct AffirmArgs {
    /// Wait for the ferrets' verdict
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait for a verdict with --wait
    #[arg(long, default_value = "60")]
    pub timeout: u64,
}

#[derive(Debug, Serialize)]
pub struct AffirmOutput {
    pub trial_id: Uuid,
    pub phrase: String,
    pub message: String,
    /// Present with --wait once the trial settled
    pub trial: Option<Trial>,
}

impl CommandOutput for AffirmOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Sharing with the ferrets: \"{}\"", self.phrase),
            format!("  Trial ID: {}", self.trial_id),
            format!("  {}", self.message),
        ];
        match &self.trial {
            Some(trial) => lines.push(describe_outcome(trial)),
            None => lines.push("\nRun `fickle-ferrets history` to see the ferrets' reaction.".to_string()),
        }
        lines.join("\n")
    }
}

fn describe_outcome(trial: &Trial) -> String {
    match (trial.status, trial.verdict) {
        (TrialStatus::Resolved, Some(true)) => "\nJoy sparked!".to_string(),
        (TrialStatus::Resolved, _) => "\nThe ferrets were unimpressed.".to_string(),
        (TrialStatus::Failed, _) => format!(
            "\nThe ferrets never answered: {}",
            trial.failure_reason.as_deref().unwrap_or("unknown reason")
        ),
        (TrialStatus::Pending, _) => "\nStill contemplating...".to_string(),
    }
}

pub async fn execute(args: AffirmArgs, client: &ApiClient, json_mode: bool) -> Result<()> {
    let ack = client.submit_affirmation().await?;

    let trial = if args.wait {
        Some(wait_for_verdict(client, ack.trial_id, Duration::from_secs(args.timeout)).await?)
    } else {
        None
    };

    output(
        &AffirmOutput {
            trial_id: ack.trial_id,
            phrase: ack.phrase,
            message: ack.message,
            trial,
        },
        json_mode,
    );
    Ok(())
}

/// Poll until the trial leaves `pending` or the timeout passes.
async fn wait_for_verdict(client: &ApiClient, trial_id: Uuid, timeout: Duration) -> Result<Trial> {
    let deadline = Instant::now() + timeout;
    loop {
        let trial = client.get_trial(trial_id).await?;
        if trial.status.is_terminal() || Instant::now() >= deadline {
            return Ok(trial);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
