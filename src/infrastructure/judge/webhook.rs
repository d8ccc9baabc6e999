//! Verdict delivery over an HTTP webhook.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::time::Duration;

use crate::domain::models::VerdictEvent;
use crate::domain::ports::{DeliveryError, VerdictSink};

/// Posts verdict events to the callback endpoint, the way the judge's own
/// webhook would.
#[derive(Debug, Clone)]
pub struct WebhookVerdictSink {
    http_client: ReqwestClient,
    callback_url: String,
}

impl WebhookVerdictSink {
    pub fn new(callback_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self {
            http_client,
            callback_url: callback_url.into(),
        })
    }
}

#[async_trait]
impl VerdictSink for WebhookVerdictSink {
    async fn deliver(&self, event: VerdictEvent) -> Result<(), DeliveryError> {
        self.http_client
            .post(&self.callback_url)
            .json(&event)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DeliveryError(format!("POST {} failed: {e}", self.callback_url)))?;

        tracing::debug!(trial_id = %event.trial_id, url = %self.callback_url, "verdict posted to webhook");
        Ok(())
    }
}
