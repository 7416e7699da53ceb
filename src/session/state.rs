//! Session state and user notifications.

use crate::error::{AnalysisError, NotificationKind};
use crate::models::AnalysisResult;

/// What the session is currently showing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Waiting on a job or a result fetch. `job_id` is known once the
    /// backend has accepted a submission.
    Loading { job_id: Option<String> },
    /// A result is on screen, optionally narrowed to one cluster.
    Displaying {
        result: Box<AnalysisResult>,
        cluster: Option<String>,
    },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            SessionState::Displaying { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn cluster(&self) -> Option<&str> {
        match self {
            SessionState::Displaying { cluster, .. } => cluster.as_deref(),
            _ => None,
        }
    }
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl From<&AnalysisError> for Notification {
    fn from(error: &AnalysisError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
