//! CLI command implementations.

pub mod affirm;
pub mod champion;
pub mod experiment;
pub mod history;
pub mod serve;

use anyhow::Result;

use super::client::ApiClient;
use crate::domain::models::Config;

/// Client for `--server`, or the configured listen address.
pub fn api_client(server: Option<&str>, config: &Config) -> Result<ApiClient> {
    match server {
        Some(url) => ApiClient::new(url),
        None => ApiClient::new(config.server.base_url()),
    }
}
