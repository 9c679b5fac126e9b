// ABOUTME: Error kinds shared across the pipeline and the StageError record stored on the workflow state.
// ABOUTME: Also defines ValidationError for rejecting malformed input before a run starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::StageName;

/// Classification of everything that can go wrong in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input or an unparseable service response.
    Validation,
    /// Network, timeout, rate limit or non-2xx reply from an external service.
    Service,
    /// Stage skipped because a prerequisite failed.
    DependencyUnmet,
    /// Run aborted by the caller.
    Cancelled,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Service => "service_error",
            ErrorKind::DependencyUnmet => "dependency_unmet",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A failure recorded against one stage. Appended to the workflow state,
/// never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: StageName,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StageError {
    pub fn new(stage: StageName, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn validation(stage: StageName, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Validation, message)
    }

    pub fn service(stage: StageName, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Service, message)
    }

    /// Error for a stage that never ran because `failed` did not complete.
    pub fn dependency_unmet(stage: StageName, failed: StageName) -> Self {
        Self::new(
            stage,
            ErrorKind::DependencyUnmet,
            format!("skipped because {} did not complete", failed),
        )
    }

    pub fn cancelled(stage: StageName) -> Self {
        Self::new(stage, ErrorKind::Cancelled, "run cancelled before stage was dispatched")
    }

    /// Cancellation that arrived while `stage` was already running. The
    /// stage keeps its own outcome.
    pub fn cancelled_in_flight(stage: StageName) -> Self {
        Self::new(stage, ErrorKind::Cancelled, "run cancelled while stage was in flight")
    }
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.stage, self.kind, self.message)
    }
}

/// Input rejected before a run starts. No workflow state is created and no
/// events are emitted when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tone sample must be at least {min} characters long (got {actual})")]
    ToneSampleTooShort { min: usize, actual: usize },

    #[error("topic must be at least {min} characters long (got {actual})")]
    TopicTooShort { min: usize, actual: usize },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
