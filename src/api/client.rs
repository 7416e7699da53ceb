//! HTTP client for the analysis backend.

use super::AnalysisApi;
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, HistoryItem, StatusResponse, SubmitResponse};
use crate::repo::RepoRef;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// [`AnalysisApi`] over HTTP.
///
/// No request timeout is configured: the backend's `timed-out` status is the
/// only deadline the client honours.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    http_client: Client,
}

impl HttpApi {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:8000/api/v1`).
    pub fn new(base_url: &str) -> Result<Self, AnalysisError> {
        let http_client = Client::builder()
            .user_agent(concat!("codefable/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::transport("Create HTTP client", e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, AnalysisError> {
        let url = self.url(path);
        debug!("{} -> GET {}", operation, url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::transport(
                        operation,
                        format!("cannot connect to analysis backend at {}", self.base_url),
                    )
                } else {
                    AnalysisError::transport(operation, format!("request error: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Transport {
                operation,
                status: Some(status.as_u16()),
                message: error_detail(status, &body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, AnalysisError> {
        self.get(operation, path, &[])
            .await?
            .json::<T>()
            .await
            .map_err(|e| AnalysisError::transport(operation, format!("invalid response: {}", e)))
    }
}

/// Error message for a non-success response, preferring the backend's
/// `detail` field.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from));

    match detail {
        Some(detail) => format!("HTTP {}: {}", status.as_u16(), detail),
        None => format!("HTTP {}", status),
    }
}

#[async_trait]
impl AnalysisApi for HttpApi {
    async fn submit(&self, repo: &RepoRef) -> Result<SubmitResponse, AnalysisError> {
        const OP: &str = "Start analysis";

        let body: Value = self
            .get(OP, "analyze", &[("repo", repo.to_string())])
            .await?
            .json()
            .await
            .map_err(|e| AnalysisError::transport(OP, format!("invalid response: {}", e)))?;

        SubmitResponse::from_json(body)
            .map_err(|e| AnalysisError::transport(OP, format!("unexpected response: {}", e)))
    }

    async fn status(&self, job_id: &str) -> Result<StatusResponse, AnalysisError> {
        const OP: &str = "Poll job status";

        let body: Value = self.get_json(OP, &format!("status/{}", job_id)).await?;
        StatusResponse::from_json(body)
            .map_err(|e| AnalysisError::transport(OP, format!("unexpected response: {}", e)))
    }

    async fn result(&self, id: &str) -> Result<AnalysisResult, AnalysisError> {
        self.get_json("Fetch results", &format!("results/{}", id))
            .await
    }

    async fn history(&self) -> Result<Vec<HistoryItem>, AnalysisError> {
        self.get_json("Load history", "history")
            .await
            .map_err(|e| AnalysisError::HistoryLoad(e.to_string()))
    }
}
