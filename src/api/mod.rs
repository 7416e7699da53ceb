//! Analysis backend API.
//!
//! [`AnalysisApi`] is the contract the rest of the crate talks to. [`HttpApi`]
//! implements it over HTTP with reqwest.

pub mod client;
#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpApi;

use crate::error::AnalysisError;
use crate::models::{AnalysisResult, HistoryItem, StatusResponse, SubmitResponse};
use crate::repo::RepoRef;
use async_trait::async_trait;

/// Operations exposed by the analysis backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync + 'static {
    /// Start an analysis of `repo`.
    async fn submit(&self, repo: &RepoRef) -> Result<SubmitResponse, AnalysisError>;

    /// Current status of a job.
    async fn status(&self, job_id: &str) -> Result<StatusResponse, AnalysisError>;

    /// A persisted result by id.
    async fn result(&self, id: &str) -> Result<AnalysisResult, AnalysisError>;

    /// Past analyses, newest first.
    async fn history(&self) -> Result<Vec<HistoryItem>, AnalysisError>;
}
