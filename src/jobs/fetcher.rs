//! Retrieval of persisted analysis results.

use crate::api::AnalysisApi;
use crate::error::AnalysisError;
use crate::models::AnalysisResult;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches results by id.
///
/// Results are immutable once stored, so every successful fetch is cached
/// for the lifetime of the fetcher.
pub struct ResultFetcher<A> {
    api: Arc<A>,
    cache: Arc<DashMap<String, AnalysisResult>>,
}

impl<A> Clone for ResultFetcher<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<A: AnalysisApi> ResultFetcher<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Fetch the result with the given id.
    pub async fn fetch(&self, id: &str) -> Result<AnalysisResult, AnalysisError> {
        let cached = self.cache.get(id).map(|entry| entry.value().clone());
        if let Some(cached) = cached {
            debug!("Result {} served from cache", id);
            return Ok(cached);
        }

        info!("Fetching result {}", id);
        let result = self.api.result(id).await?;
        self.remember(&result);
        Ok(result)
    }

    /// Cache a result obtained some other way, e.g. a synchronous submit.
    pub fn remember(&self, result: &AnalysisResult) {
        self.cache.insert(result.id.clone(), result.clone());
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }
}
