//! Error taxonomy for the analysis client.
//!
//! Every failure a component can report is an [`AnalysisError`]. The session
//! turns them into user-facing notifications; nothing here is fatal.

use thiserror::Error;

/// Errors raised while submitting, polling, or fetching analyses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The repository reference does not name an owner and a repository.
    #[error("Invalid repository reference '{input}': expected <owner>/<name> or a repository URL")]
    Validation { input: String },

    /// The backend could not be reached, answered with a non-success status,
    /// or sent a body that could not be decoded.
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The backend reported that the job failed and will not complete.
    #[error("Analysis job failed. Please try again later.")]
    JobFailed { job_id: String },

    /// The backend gave up waiting on the job; it may still finish server-side.
    #[error("Analysis timed out. The repository may be too large; the result may still become available later.")]
    JobTimedOut { job_id: String },

    /// History listing failed. Logged only.
    #[error("Failed to load history: {0}")]
    HistoryLoad(String),
}

impl AnalysisError {
    pub(crate) fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        AnalysisError::Transport {
            operation,
            status: None,
            message: message.into(),
        }
    }

    /// Notification category for this error.
    pub fn kind(&self) -> NotificationKind {
        match self {
            AnalysisError::Validation { .. } => NotificationKind::Validation,
            AnalysisError::Transport { .. } => NotificationKind::Transport,
            AnalysisError::JobFailed { .. } => NotificationKind::JobFailed,
            AnalysisError::JobTimedOut { .. } => NotificationKind::JobTimedOut,
            AnalysisError::HistoryLoad(_) => NotificationKind::HistoryLoad,
        }
    }
}

/// Category of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Validation,
    Transport,
    JobFailed,
    JobTimedOut,
    HistoryLoad,
}

/// Rejected cluster filter changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown cluster '{0}'")]
    UnknownCluster(String),

    #[error("No analysis is being displayed")]
    NothingDisplayed,
}
