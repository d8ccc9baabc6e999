//! Implementation of the `fickle-ferrets serve` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::http::FerretsHttpServer;
use crate::application::App;
use crate::domain::models::Config;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    let server_config = config.server.clone();
    let app = App::from_config(config)
        .await
        .context("Failed to start services")?;

    tracing::info!(
        judge = %app.config.judge.endpoint,
        database = %app.config.database.path,
        "fickle ferrets ready"
    );

    let server = FerretsHttpServer::new(app.http_state(), server_config);
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    app.pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
