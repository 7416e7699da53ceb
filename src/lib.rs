//! Code Fable client library.
//!
//! Submits repositories to the Code Fable analysis backend, follows the
//! resulting job to completion, and exposes the analysis (dependency graph,
//! narrative, hotspots, clusters) through an [`AnalysisSession`] with
//! cluster-filtered graph views.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod jobs;
pub mod models;
pub mod repo;
pub mod report;
pub mod session;
pub mod share;

pub use api::{AnalysisApi, HttpApi};
pub use error::{AnalysisError, FilterError, NotificationKind};
pub use graph::project;
pub use jobs::{JobEvent, JobPoller, ResultFetcher};
pub use models::{AnalysisResult, Graph, GraphLink, GraphNode, HistoryItem, LinkEndpoint};
pub use repo::RepoRef;
pub use session::{AnalysisSession, Notification, SessionState};
