//! Fickle Ferrets CLI entry point.

use clap::Parser;

use fickle_ferrets::cli::commands::{self, api_client};
use fickle_ferrets::cli::{handle_error, load_config, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    if let Commands::Serve(args) = cli.command {
        return commands::serve::execute(args, config).await;
    }

    let client = api_client(cli.server.as_deref(), &config)?;
    match cli.command {
        Commands::Serve(_) => Ok(()),
        Commands::Affirm(args) => commands::affirm::execute(args, &client, cli.json).await,
        Commands::Champion => commands::champion::execute(&client, cli.json).await,
        Commands::History(args) => commands::history::execute(args, &client, cli.json).await,
        Commands::Experiment(command) => commands::experiment::execute(command, &client, cli.json).await,
    }
}
