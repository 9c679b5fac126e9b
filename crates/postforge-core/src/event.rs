// ABOUTME: Status events emitted by the supervisor for the presentation layer to render.
// ABOUTME: Each run produces a finite, ordered stream that always ends with RunFinished.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::StageError;
use crate::stage::{RunState, StageName, StageStatus};

/// An event envelope wrapping a timestamped, sequenced payload for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub event_id: u64,
    pub run_id: Ulid,
    pub timestamp: DateTime<Utc>,
    pub payload: StatusPayload,
}

/// What happened. Stage transitions carry the error that caused a failure or
/// skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatusPayload {
    RunStarted {
        topic: String,
    },
    StageChanged {
        stage: StageName,
        status: StageStatus,
        error: Option<StageError>,
    },
    RunFinished {
        state: RunState,
    },
}

impl StatusEvent {
    /// The stage this event refers to, if any.
    pub fn stage(&self) -> Option<StageName> {
        match &self.payload {
            StatusPayload::StageChanged { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.payload, StatusPayload::RunFinished { .. })
    }
}
