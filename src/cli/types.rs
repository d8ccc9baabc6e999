//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::experiment::{ListArgs, ShowArgs, StartArgs};
use super::commands::serve::ServeArgs;
use super::commands::{affirm::AffirmArgs, history::HistoryArgs};

#[derive(Parser, Debug)]
#[command(name = "fickle-ferrets")]
#[command(about = "Fickle Ferrets - phrase judging with champion/challenger experiments", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file used instead of .ferrets/config.yaml and .ferrets/local.yaml
    #[arg(short, long, global = true, env = "FERRETS_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Server URL for client commands (defaults to the configured host and port)
    #[arg(long, global = true, env = "FERRETS_SERVER_URL")]
    pub server: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Share the champion phrase with the ferrets
    Affirm(AffirmArgs),

    /// Show the current champion phrase
    Champion,

    /// List recent trials
    History(HistoryArgs),

    /// Champion/challenger experiments
    #[command(subcommand)]
    Experiment(ExperimentCommands),
}

#[derive(Subcommand, Debug)]
pub enum ExperimentCommands {
    /// Start an experiment against the current champion
    Start(StartArgs),

    /// List experiments
    List(ListArgs),

    /// Show one experiment with its results
    Show(ShowArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_experiment_start() {
        let cli = Cli::try_parse_from([
            "fickle-ferrets",
            "--json",
            "experiment",
            "start",
            "sunny",
            "You are radiant",
            "--runs",
            "20",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Experiment(ExperimentCommands::Start(args)) => {
                assert_eq!(args.name, "sunny");
                assert_eq!(args.phrase, "You are radiant");
                assert_eq!(args.runs, Some(20));
                assert!(!args.wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_default_limit() {
        let cli = Cli::try_parse_from(["fickle-ferrets", "history"]).unwrap();
        match cli.command {
            Commands::History(args) => assert_eq!(args.limit, 50),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
