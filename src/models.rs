//! Data models for analysis results, jobs, and history.
//!
//! These mirror the JSON bodies exchanged with the analysis backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable reference key, unique within a graph.
    pub id: String,
    /// Cluster the node belongs to; `None` when unclustered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Rendering weight.
    #[serde(default = "default_node_size")]
    pub size: f64,
}

fn default_node_size() -> f64 {
    1.0
}

impl GraphNode {
    pub fn new(id: impl Into<String>, group: Option<&str>, size: f64) -> Self {
        Self {
            id: id.into(),
            group: group.map(String::from),
            size: size.max(0.0),
        }
    }
}

/// One end of a link.
///
/// Renderers replace bare ids with the node object they resolved, so both
/// shapes show up in practice. Always go through [`LinkEndpoint::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEndpoint {
    Id(String),
    Node(GraphNode),
}

impl LinkEndpoint {
    /// The node id this endpoint refers to.
    pub fn id(&self) -> &str {
        match self {
            LinkEndpoint::Id(id) => id,
            LinkEndpoint::Node(node) => &node.id,
        }
    }
}

impl From<&str> for LinkEndpoint {
    fn from(id: &str) -> Self {
        LinkEndpoint::Id(id.to_string())
    }
}

/// A directed dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
}

impl GraphLink {
    pub fn new(source: impl Into<LinkEndpoint>, target: impl Into<LinkEndpoint>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Nodes and links of a dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl Graph {
    /// Ids of all nodes in the graph.
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Number of links with an endpoint that is not a node of this graph.
    pub fn dangling_links(&self) -> usize {
        let ids = self.node_ids();
        self.links
            .iter()
            .filter(|l| !ids.contains(l.source.id()) || !ids.contains(l.target.id()))
            .count()
    }

    /// Copy of the graph keeping only links whose endpoints are both nodes.
    pub fn without_dangling_links(&self) -> Graph {
        let ids = self.node_ids();
        Graph {
            nodes: self.nodes.clone(),
            links: self
                .links
                .iter()
                .filter(|l| ids.contains(l.source.id()) && ids.contains(l.target.id()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Backend-computed metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// File paths in significance order. Duplicates are kept.
    #[serde(default)]
    pub hotspots: Vec<String>,

    /// Lines changed per file path.
    #[serde(default)]
    pub churn: BTreeMap<String, u64>,
}

/// A persisted analysis of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub graph: Graph,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub metrics: Metrics,
    /// Cluster name to ordered member ids.
    #[serde(default)]
    pub clusters: BTreeMap<String, Vec<String>>,
}

impl AnalysisResult {
    /// Cluster names in sorted order.
    pub fn cluster_names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn has_cluster(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    /// `owner/name` of the analyzed repository.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Identity of a past analysis, as listed in the history sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub owner: String,
    pub name: String,
}

impl From<&AnalysisResult> for HistoryItem {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            id: result.id.clone(),
            owner: result.owner.clone(),
            name: result.name.clone(),
        }
    }
}

impl fmt::Display for HistoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Status of a backend job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Map a wire status string. Unrecognized values count as pending.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "timed-out" | "timed_out" | "timedout" | "timeout" => JobStatus::TimedOut,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::TimedOut => write!(f, "timed-out"),
        }
    }
}

/// A job being tracked by the poller. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    /// Result to fetch once the job completes.
    pub result_id: Option<String>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, result_id: Option<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            result_id,
        }
    }
}

/// Outcome of the submit request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    /// The backend queued a job to poll.
    Accepted {
        job_id: String,
        repo_id: Option<String>,
    },
    /// The backend answered with a finished result right away.
    Ready(Box<AnalysisResult>),
}

impl SubmitResponse {
    /// Interpret a submit body. A `job_id` selects the async path; otherwise
    /// the body is a result, either under `repo` or at the top level.
    pub fn from_json(body: Value) -> Result<Self, serde_json::Error> {
        if let Some(job_id) = body.get("job_id").and_then(id_string) {
            let repo_id = body.get("repo_id").and_then(id_string);
            return Ok(SubmitResponse::Accepted { job_id, repo_id });
        }

        let result_body = match body {
            Value::Object(mut map) if map.contains_key("repo") => {
                map.remove("repo").unwrap_or(Value::Null)
            }
            other => other,
        };
        let result: AnalysisResult = serde_json::from_value(result_body)?;
        Ok(SubmitResponse::Ready(Box::new(result)))
    }
}

/// Decoded status poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: JobStatus,
    /// Status string as sent by the backend.
    pub raw_status: String,
    pub result_id: Option<String>,
}

impl StatusResponse {
    pub fn from_json(body: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Wire {
            status: String,
            #[serde(default)]
            result_id: Option<Value>,
            #[serde(default)]
            repo_id: Option<Value>,
        }

        let wire: Wire = serde_json::from_value(body)?;
        let result_id = wire
            .result_id
            .as_ref()
            .and_then(id_string)
            .or_else(|| wire.repo_id.as_ref().and_then(id_string));

        Ok(Self {
            status: JobStatus::from_wire(&wire.status),
            raw_status: wire.status,
            result_id,
        })
    }
}

/// Ids arrive as strings or numbers depending on the backend store.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
