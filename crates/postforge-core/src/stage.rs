// ABOUTME: Names the four pipeline stages and the per-stage and per-run status machines.
// ABOUTME: StageStatus encodes which transitions are legal; RunState is the terminal verdict of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One named unit of orchestrated work. Variant order is plan order, so a
/// `BTreeMap<StageName, _>` iterates Tone, Research, Content, Image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Tone,
    Research,
    Content,
    Image,
}

impl StageName {
    pub const ALL: [StageName; 4] = [
        StageName::Tone,
        StageName::Research,
        StageName::Content,
        StageName::Image,
    ];

    /// Return a human-readable label for this stage.
    pub fn label(&self) -> &'static str {
        match self {
            StageName::Tone => "tone_analysis",
            StageName::Research => "research",
            StageName::Content => "content_creation",
            StageName::Image => "image_generation",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a single stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    /// Whether the stage has reached a final status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Completed | StageStatus::Failed | StageStatus::Skipped
        )
    }

    /// Legal moves: pending -> running -> {completed | failed}, pending -> skipped.
    pub fn can_transition_to(&self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::Pending, StageStatus::Running)
                | (StageStatus::Pending, StageStatus::Skipped)
                | (StageStatus::Running, StageStatus::Completed)
                | (StageStatus::Running, StageStatus::Failed)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Global state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    InProgress,
    Completed,
    PartiallyCompleted,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::PartiallyCompleted | RunState::Failed
        )
    }

    /// True when the run produced post text the caller can use.
    pub fn has_usable_output(&self) -> bool {
        matches!(self, RunState::Completed | RunState::PartiallyCompleted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::InProgress => "in_progress",
            RunState::Completed => "completed",
            RunState::PartiallyCompleted => "partially_completed",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
