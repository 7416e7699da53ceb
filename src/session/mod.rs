//! The analysis session.
//!
//! [`AnalysisSession`] owns the session state and is the only thing that
//! changes it. Submissions and result fetches run as spawned tasks that
//! report back over a channel; each report is tagged with the generation it
//! was started under, and anything from an older generation is dropped.
//! Starting a new operation bumps the generation and aborts the old task.

pub mod state;

pub use state::{Notification, SessionState};

use crate::api::AnalysisApi;
use crate::error::{AnalysisError, FilterError};
use crate::graph::project;
use crate::jobs::{JobEvent, JobPoller, ResultFetcher};
use crate::models::{AnalysisResult, Graph, HistoryItem};
use crate::share;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct Envelope {
    generation: u64,
    message: TaskMessage,
}

enum TaskMessage {
    /// Progress of a submitted job.
    Job(Result<JobEvent, AnalysisError>),
    /// Fetch of an already known result (history or shared link).
    Reopened(Result<AnalysisResult, AnalysisError>),
}

/// Orchestrates submissions, history, and cluster filtering.
pub struct AnalysisSession<A: AnalysisApi> {
    api: Arc<A>,
    poller: JobPoller<A>,
    fetcher: ResultFetcher<A>,
    state: SessionState,
    history: Vec<HistoryItem>,
    notifications: Vec<Notification>,
    generation: u64,
    task: Option<JoinHandle<()>>,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl<A: AnalysisApi> AnalysisSession<A> {
    pub fn new(api: Arc<A>, poll_interval: Duration) -> Self {
        let fetcher = ResultFetcher::new(Arc::clone(&api));
        let poller = JobPoller::new(Arc::clone(&api), fetcher.clone(), poll_interval);
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            api,
            poller,
            fetcher,
            state: SessionState::Idle,
            history: Vec::new(),
            notifications: Vec::new(),
            generation: 0,
            task: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Past analyses, newest first.
    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.state.result()
    }

    pub fn cluster_filter(&self) -> Option<&str> {
        self.state.cluster()
    }

    /// The graph to render for the displayed result and cluster filter.
    /// Links with an endpoint outside the node set are never part of it.
    pub fn visible_graph(&self) -> Option<Graph> {
        match &self.state {
            SessionState::Displaying { result, cluster } => {
                Some(project(&result.graph, cluster.as_deref()).without_dangling_links())
            }
            _ => None,
        }
    }

    /// Link that reopens the displayed result. The cluster filter is not
    /// part of the link.
    pub fn share_link(&self, app_url: &str) -> Option<String> {
        let result = self.state.result()?;
        match share::share_link(app_url, &result.id) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!("Cannot build share link: {}", e);
                None
            }
        }
    }

    /// Drain pending user notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Load the history listing. Failure is logged and leaves history empty.
    pub async fn load_history(&mut self) {
        match self.api.history().await {
            Ok(items) => {
                debug!("Loaded {} history entries", items.len());
                self.history = items;
            }
            Err(e) => {
                let e = match e {
                    AnalysisError::HistoryLoad(_) => e,
                    other => AnalysisError::HistoryLoad(other.to_string()),
                };
                warn!("{}", e);
            }
        }
    }

    /// Submit a repository for analysis.
    ///
    /// Supersedes whatever was in flight. A malformed reference returns the
    /// session to idle with a notification and no request is made.
    pub fn submit(&mut self, reference: &str) {
        let generation = self.supersede();

        let stream = match self.poller.submit(reference) {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        self.state = SessionState::Loading { job_id: None };

        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut stream = stream;
            let mut settled = false;

            while let Some(item) = stream.next().await {
                settled = match &item {
                    Ok(event) => event.is_terminal(),
                    Err(_) => true,
                };
                let envelope = Envelope {
                    generation,
                    message: TaskMessage::Job(item),
                };
                if tx.send(envelope).is_err() {
                    return;
                }
            }

            if !settled {
                let _ = tx.send(Envelope {
                    generation,
                    message: TaskMessage::Job(Err(AnalysisError::transport(
                        "Track job",
                        "job ended without a terminal status",
                    ))),
                });
            }
        }));
    }

    /// Show a result from the history list.
    pub fn select_history_item(&mut self, item: &HistoryItem) {
        info!("Opening {} from history", item);
        self.reopen(item.id.clone());
    }

    /// Show the result a shared link (or bare result id) points to.
    pub fn open_shared(&mut self, link: &str) {
        match share::parse_shared(link) {
            Some(id) => {
                info!("Opening shared result {}", id);
                self.reopen(id);
            }
            None => {
                let e = AnalysisError::Validation {
                    input: link.to_string(),
                };
                warn!("{}", e);
                self.notifications.push(Notification::from(&e));
            }
        }
    }

    /// Narrow the displayed graph to one cluster, or clear the filter.
    pub fn select_cluster(&mut self, cluster: Option<&str>) -> Result<(), FilterError> {
        let SessionState::Displaying {
            result,
            cluster: current,
        } = &mut self.state
        else {
            return Err(FilterError::NothingDisplayed);
        };

        if let Some(name) = cluster {
            if !result.has_cluster(name) {
                return Err(FilterError::UnknownCluster(name.to_string()));
            }
        }

        debug!("Cluster filter: {:?}", cluster);
        *current = cluster.map(String::from);
        Ok(())
    }

    /// Drop the current result and filter. History is kept.
    pub fn new_session(&mut self) {
        self.supersede();
        self.state = SessionState::Idle;
    }

    /// Wait for the in-flight operation to report and apply it.
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn step(&mut self) -> bool {
        if !self.is_loading() {
            return false;
        }

        while let Some(envelope) = self.rx.recv().await {
            if self.apply(envelope) {
                return true;
            }
        }
        false
    }

    /// Apply reports until the session leaves the loading state.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Invalidate and cancel the in-flight operation. Returns the new
    /// generation.
    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            debug!("Cancelling superseded task");
            task.abort();
        }
        self.generation
    }

    fn reopen(&mut self, id: String) {
        let generation = self.supersede();
        self.state = SessionState::Loading { job_id: None };

        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let result = fetcher.fetch(&id).await;
            let _ = tx.send(Envelope {
                generation,
                message: TaskMessage::Reopened(result),
            });
        }));
    }

    /// Apply one report. Returns `false` if it came from a superseded task.
    fn apply(&mut self, envelope: Envelope) -> bool {
        if envelope.generation != self.generation {
            debug!(
                "Discarding report from superseded generation {} (current {})",
                envelope.generation, self.generation
            );
            return false;
        }

        match envelope.message {
            TaskMessage::Job(Ok(JobEvent::Accepted { job_id })) => {
                self.state = SessionState::Loading {
                    job_id: Some(job_id),
                };
            }
            TaskMessage::Job(Ok(JobEvent::Pending { .. })) => {}
            TaskMessage::Job(Ok(JobEvent::Completed(result))) => self.display(*result, true),
            TaskMessage::Job(Ok(JobEvent::Failed { job_id })) => {
                self.fail(AnalysisError::JobFailed { job_id })
            }
            TaskMessage::Job(Ok(JobEvent::TimedOut { job_id })) => {
                self.fail(AnalysisError::JobTimedOut { job_id })
            }
            TaskMessage::Reopened(Ok(result)) => self.display(result, false),
            TaskMessage::Job(Err(e)) | TaskMessage::Reopened(Err(e)) => self.fail(e),
        }
        true
    }

    fn display(&mut self, result: AnalysisResult, record: bool) {
        let dangling = result.graph.dangling_links();
        if dangling > 0 {
            warn!(
                "Result {} has {} dangling link(s); they will not be rendered",
                result.id, dangling
            );
        }

        info!("Displaying analysis of {}", result.full_name());
        if record {
            self.history.insert(0, HistoryItem::from(&result));
        }
        self.task = None;
        self.state = SessionState::Displaying {
            result: Box::new(result),
            cluster: None,
        };
    }

    fn fail(&mut self, e: AnalysisError) {
        match &e {
            AnalysisError::Validation { .. } => warn!("{}", e),
            _ => error!("{}", e),
        }
        self.notifications.push(Notification::from(&e));
        self.task = None;
        self.state = SessionState::Idle;
    }
}
