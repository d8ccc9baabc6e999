//! Judge HTTP client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::models::JudgeConfig;
use crate::domain::ports::{JudgeClient, JudgeError};

/// Configuration for the judge client
#[derive(Debug, Clone)]
pub struct JudgeClientConfig {
    /// Scoring endpoint
    pub endpoint: String,
    /// Bounded wait for the whole request
    pub timeout_secs: u64,
}

impl Default for JudgeClientConfig {
    fn default() -> Self {
        Self::from(&JudgeConfig::default())
    }
}

impl From<&JudgeConfig> for JudgeClientConfig {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct JudgeRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct JudgeResponse {
    result: bool,
}

/// Judge client over HTTP.
///
/// POSTs `{"input": phrase}` and expects `{"result": <bool>}` back. Failures
/// are classified and returned as-is; nothing is retried here.
#[derive(Debug, Clone)]
pub struct HttpJudgeClient {
    http_client: ReqwestClient,
    endpoint: String,
    timeout_secs: u64,
}

impl HttpJudgeClient {
    pub fn with_config(config: JudgeClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build judge HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify(&self, err: &reqwest::Error) -> JudgeError {
        if err.is_timeout() {
            JudgeError::Timeout(self.timeout_secs)
        } else if err.is_decode() {
            JudgeError::Protocol(err.to_string())
        } else {
            JudgeError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn judge(&self, phrase: &str) -> Result<bool, JudgeError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&JudgeRequest { input: phrase })
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(&e))?;

        if !status.is_success() {
            return Err(JudgeError::Protocol(format!("judge returned {status}: {body}")));
        }

        let parsed: JudgeResponse = serde_json::from_str(&body)
            .map_err(|e| JudgeError::Protocol(format!("malformed verdict {body:?}: {e}")))?;

        debug!(verdict = parsed.result, "judge responded");
        Ok(parsed.result)
    }
}
