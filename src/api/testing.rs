//! Scripted in-memory backend for tests.

use super::AnalysisApi;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisResult, Graph, GraphNode, HistoryItem, JobStatus, Metrics, StatusResponse,
    SubmitResponse,
};
use crate::repo::RepoRef;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Scripted<T> = Result<T, AnalysisError>;

/// Backend double answering from scripted responses.
///
/// Status queues replay their last entry once drained, so a single
/// `pending` keeps a job pending forever.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    submits: Mutex<HashMap<String, Scripted<SubmitResponse>>>,
    statuses: Mutex<HashMap<String, VecDeque<Scripted<StatusResponse>>>>,
    results: Mutex<HashMap<String, AnalysisResult>>,
    history: Mutex<Option<Scripted<Vec<HistoryItem>>>>,
    calls: AtomicUsize,
    result_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(self, repo: &str, job_id: &str, repo_id: Option<&str>) -> Self {
        self.with_submit(
            repo,
            Ok(SubmitResponse::Accepted {
                job_id: job_id.to_string(),
                repo_id: repo_id.map(String::from),
            }),
        )
    }

    pub fn with_submit(self, repo: &str, response: Scripted<SubmitResponse>) -> Self {
        self.submits
            .lock()
            .unwrap()
            .insert(repo.to_string(), response);
        self
    }

    pub fn with_statuses(self, job_id: &str, statuses: Vec<Scripted<StatusResponse>>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), statuses.into());
        self
    }

    pub fn with_result(self, result: AnalysisResult) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(result.id.clone(), result);
        self
    }

    pub fn with_history(self, history: Scripted<Vec<HistoryItem>>) -> Self {
        *self.history.lock().unwrap() = Some(history);
        self
    }

    /// Total number of backend calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of result fetches made.
    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn submit(&self, repo: &RepoRef) -> Result<SubmitResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submits
            .lock()
            .unwrap()
            .get(&repo.to_string())
            .cloned()
            .unwrap_or_else(|| Err(not_found("Start analysis")))
    }

    async fn status(&self, job_id: &str) -> Result<StatusResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let queue = match statuses.get_mut(job_id) {
            Some(queue) => queue,
            None => return Err(not_found("Poll job status")),
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }

    async fn result(&self, id: &str) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Fetch results"))
    }

    async fn history(&self) -> Result<Vec<HistoryItem>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn not_found(operation: &'static str) -> AnalysisError {
    AnalysisError::Transport {
        operation,
        status: Some(404),
        message: "HTTP 404 Not Found".to_string(),
    }
}

pub(crate) fn status(raw: &str, result_id: Option<&str>) -> Scripted<StatusResponse> {
    Ok(StatusResponse {
        status: JobStatus::from_wire(raw),
        raw_status: raw.to_string(),
        result_id: result_id.map(String::from),
    })
}

/// A small result with one `core` cluster and one `ui` cluster.
pub(crate) fn sample_result(id: &str, owner: &str, name: &str) -> AnalysisResult {
    AnalysisResult {
        id: id.to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
        graph: Graph {
            nodes: vec![
                GraphNode::new("a", Some("core"), 1.0),
                GraphNode::new("b", Some("core"), 2.0),
                GraphNode::new("c", Some("ui"), 1.0),
            ],
            links: vec![
                crate::models::GraphLink::new("a", "b"),
                crate::models::GraphLink::new("c", "a"),
            ],
        },
        narrative: format!("The tale of {}/{}.", owner, name),
        metrics: Metrics {
            hotspots: vec!["src/a.rs".to_string(), "src/c.rs".to_string()],
            churn: BTreeMap::from([("src/a.rs".to_string(), 120), ("src/c.rs".to_string(), 40)]),
        },
        clusters: BTreeMap::from([
            ("core".to_string(), vec!["a".to_string(), "b".to_string()]),
            ("ui".to_string(), vec!["c".to_string()]),
        ]),
    }
}
