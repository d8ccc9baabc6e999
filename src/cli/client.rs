//! HTTP client for a running server.

use anyhow::{bail, Context, Result};
use reqwest::{Client as ReqwestClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

use crate::adapters::http::{
    AffirmationResponse, CreateExperimentRequest, ErrorResponse, ExperimentResponse,
};
use crate::domain::models::{ChampionPhrase, Trial};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed client for the judging API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: ReqwestClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn submit_affirmation(&self) -> Result<AffirmationResponse> {
        let response = self.send(self.http_client.post(self.url("/affirmation"))).await?;
        decode(response).await
    }

    pub async fn get_trial(&self, id: Uuid) -> Result<Trial> {
        let response = self.send(self.http_client.get(self.url(&format!("/trials/{id}")))).await?;
        decode(response).await
    }

    pub async fn trial_history(&self, limit: usize) -> Result<Vec<Trial>> {
        let request = self
            .http_client
            .get(self.url("/trials/history"))
            .query(&[("limit", limit)]);
        decode(self.send(request).await?).await
    }

    pub async fn champion(&self) -> Result<ChampionPhrase> {
        decode(self.send(self.http_client.get(self.url("/champion"))).await?).await
    }

    pub async fn create_experiment(&self, request: &CreateExperimentRequest) -> Result<ExperimentResponse> {
        let response = self
            .send(self.http_client.post(self.url("/experiments")).json(request))
            .await?;
        decode(response).await
    }

    pub async fn list_experiments(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ExperimentResponse>> {
        let mut request = self.http_client.get(self.url("/experiments"));
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        decode(self.send(request).await?).await
    }

    pub async fn get_experiment(&self, id: Uuid) -> Result<ExperimentResponse> {
        let response = self
            .send(self.http_client.get(self.url(&format!("/experiments/{id}"))))
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        request.send().await.with_context(|| {
            format!(
                "Could not reach the server at {}. Is `fickle-ferrets serve` running?",
                self.base_url
            )
        })
    }
}

/// Decode a success body, or turn an error body into a readable error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Failed to decode server response");
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => bail!("{} [{}]: {}", status, err.code, err.error),
        Err(_) => bail!("{status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_champion_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/champion")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"phrase": "Whoosa good ferret!", "updated_at": "2024-05-01T12:00:00Z"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(format!("{}/", server.url())).unwrap();
        let champion = client.champion().await.unwrap();

        assert_eq!(champion.phrase, "Whoosa good ferret!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/experiments")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Experiment abc is already active", "code": "CONFLICT"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client
            .create_experiment(&CreateExperimentRequest {
                name: "n".to_string(),
                variant_b_phrase: "p".to_string(),
                target_runs: None,
            })
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("409"));
        assert!(message.contains("CONFLICT"));
        assert!(message.contains("already active"));
    }
}
