//! Job submission and status polling.
//!
//! A submission is tracked by a small state machine (submit, poll, done)
//! driven through [`futures::stream::unfold`]. Every step yields one event;
//! the stream ends right after a terminal event or an error. Dropping the
//! stream cancels the loop at its next suspension point.

use crate::api::AnalysisApi;
use crate::error::AnalysisError;
use crate::jobs::fetcher::ResultFetcher;
use crate::models::{AnalysisResult, Job, JobStatus, SubmitResponse};
use crate::repo::RepoRef;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Progress of a tracked submission.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The backend queued a job.
    Accepted { job_id: String },
    /// A poll came back non-terminal.
    Pending {
        job_id: String,
        status: String,
        attempt: u32,
    },
    /// The job finished and its result was fetched.
    Completed(Box<AnalysisResult>),
    /// The backend reported the job as failed.
    Failed { job_id: String },
    /// The backend stopped waiting on the job.
    TimedOut { job_id: String },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Completed(_) | JobEvent::Failed { .. } | JobEvent::TimedOut { .. }
        )
    }
}

/// Events of one submission. Ends after a terminal event or the first error.
pub type JobStream = BoxStream<'static, Result<JobEvent, AnalysisError>>;

type Step = (Result<JobEvent, AnalysisError>, PollState);

enum PollState {
    Submit(RepoRef),
    Poll { job: Job, attempt: u32 },
    Done,
}

/// Submits analyses and follows their jobs to completion.
pub struct JobPoller<A> {
    api: Arc<A>,
    fetcher: ResultFetcher<A>,
    interval: Duration,
}

impl<A> Clone for JobPoller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            fetcher: self.fetcher.clone(),
            interval: self.interval,
        }
    }
}

impl<A: AnalysisApi> JobPoller<A> {
    pub fn new(api: Arc<A>, fetcher: ResultFetcher<A>, interval: Duration) -> Self {
        Self {
            api,
            fetcher,
            interval,
        }
    }

    /// Start tracking an analysis of `reference`.
    ///
    /// The reference is validated before anything is sent; an invalid one
    /// fails immediately with [`AnalysisError::Validation`].
    pub fn submit(&self, reference: &str) -> Result<JobStream, AnalysisError> {
        let repo = RepoRef::parse(reference)?;
        info!("Submitting analysis for {}", repo);
        Ok(self.track(repo))
    }

    fn track(&self, repo: RepoRef) -> JobStream {
        let poller = self.clone();
        stream::unfold(PollState::Submit(repo), move |state| {
            let poller = poller.clone();
            async move { poller.advance(state).await }
        })
        .boxed()
    }

    async fn advance(&self, state: PollState) -> Option<Step> {
        match state {
            PollState::Done => None,
            PollState::Submit(repo) => Some(self.start(&repo).await),
            PollState::Poll { job, attempt } => {
                tokio::time::sleep(self.interval).await;
                Some(self.poll(job, attempt).await)
            }
        }
    }

    async fn start(&self, repo: &RepoRef) -> Step {
        match self.api.submit(repo).await {
            Ok(SubmitResponse::Accepted { job_id, repo_id }) => {
                info!("Analysis of {} queued as job {}", repo, job_id);
                let job = Job::new(job_id.clone(), repo_id);
                (
                    Ok(JobEvent::Accepted { job_id }),
                    PollState::Poll { job, attempt: 1 },
                )
            }
            Ok(SubmitResponse::Ready(result)) => {
                info!("Analysis of {} returned immediately as {}", repo, result.id);
                self.fetcher.remember(&result);
                (Ok(JobEvent::Completed(result)), PollState::Done)
            }
            Err(e) => (Err(e), PollState::Done),
        }
    }

    async fn poll(&self, mut job: Job, attempt: u32) -> Step {
        let response = match self.api.status(&job.job_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Polling job {} failed: {}", job.job_id, e);
                return (Err(e), PollState::Done);
            }
        };

        job.status = response.status;
        if response.result_id.is_some() {
            job.result_id = response.result_id;
        }

        match job.status {
            JobStatus::Completed => {
                info!("Job {} completed", job.job_id);
                let Some(result_id) = job.result_id else {
                    return (
                        Err(AnalysisError::transport(
                            "Fetch results",
                            format!("job {} completed without a result id", job.job_id),
                        )),
                        PollState::Done,
                    );
                };
                match self.fetcher.fetch(&result_id).await {
                    Ok(result) => (Ok(JobEvent::Completed(Box::new(result))), PollState::Done),
                    Err(e) => (Err(e), PollState::Done),
                }
            }
            JobStatus::Failed => {
                warn!("Job {} failed", job.job_id);
                (Ok(JobEvent::Failed { job_id: job.job_id }), PollState::Done)
            }
            JobStatus::TimedOut => {
                warn!("Job {} timed out", job.job_id);
                (Ok(JobEvent::TimedOut { job_id: job.job_id }), PollState::Done)
            }
            JobStatus::Pending => {
                debug!(
                    "Job {} still {} (poll {})",
                    job.job_id, response.raw_status, attempt
                );
                let event = JobEvent::Pending {
                    job_id: job.job_id.clone(),
                    status: response.raw_status,
                    attempt,
                };
                (
                    Ok(event),
                    PollState::Poll {
                        job,
                        attempt: attempt + 1,
                    },
                )
            }
        }
    }
}
