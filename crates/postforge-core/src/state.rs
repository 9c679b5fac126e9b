// ABOUTME: WorkflowState, the append-only record shared across the stages of one run.
// ABOUTME: Enforces write-once outputs, forward-only stage transitions, and derives the run verdict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::error::{ErrorKind, StageError};
use crate::model::{ImageAsset, Language, PostContent, ResearchFindings, StageOutput, ToneProfile};
use crate::plan::ExecutionPlan;
use crate::request::ContentRequest;
use crate::stage::{RunState, StageName, StageStatus};

/// Rejected writes to the workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("output for stage {0} was already written")]
    AlreadyWritten(StageName),

    #[error("stage {stage} cannot move from {from} to {to}")]
    InvalidTransition {
        stage: StageName,
        from: StageStatus,
        to: StageStatus,
    },

    #[error("stage {0} is not part of this run's plan")]
    UnknownStage(StageName),

    #[error("stage {stage} output requires {missing} to be present first")]
    PrerequisiteMissing {
        stage: StageName,
        missing: StageName,
    },
}

/// The full record of a single run. Created from validated input, owned by
/// the supervisor, handed to agents by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    run_id: Ulid,
    tone_sample: String,
    topic: String,
    language: Language,
    tone_profile: Option<ToneProfile>,
    research_findings: Option<ResearchFindings>,
    post_content: Option<PostContent>,
    post_image: Option<ImageAsset>,
    stage_statuses: BTreeMap<StageName, StageStatus>,
    errors: Vec<StageError>,
}

impl WorkflowState {
    /// Create the state for a new run. Every plan stage starts `Pending`.
    pub fn new(request: &ContentRequest, plan: &ExecutionPlan) -> Self {
        Self {
            run_id: Ulid::new(),
            tone_sample: request.tone_sample.clone(),
            topic: request.topic.clone(),
            language: request.language,
            tone_profile: None,
            research_findings: None,
            post_content: None,
            post_image: None,
            stage_statuses: plan.stages().map(|s| (s, StageStatus::Pending)).collect(),
            errors: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Ulid {
        self.run_id
    }

    pub fn tone_sample(&self) -> &str {
        &self.tone_sample
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn tone_profile(&self) -> Option<&ToneProfile> {
        self.tone_profile.as_ref()
    }

    pub fn research_findings(&self) -> Option<&ResearchFindings> {
        self.research_findings.as_ref()
    }

    pub fn post_content(&self) -> Option<&PostContent> {
        self.post_content.as_ref()
    }

    pub fn post_image(&self) -> Option<&ImageAsset> {
        self.post_image.as_ref()
    }

    pub fn stage_statuses(&self) -> &BTreeMap<StageName, StageStatus> {
        &self.stage_statuses
    }

    pub fn status(&self, stage: StageName) -> Option<StageStatus> {
        self.stage_statuses.get(&stage).copied()
    }

    pub fn errors(&self) -> &[StageError] {
        &self.errors
    }

    /// Move a stage to its next status. Only forward moves are accepted.
    pub fn set_status(&mut self, stage: StageName, next: StageStatus) -> Result<(), StateError> {
        let current = self
            .stage_statuses
            .get_mut(&stage)
            .ok_or(StateError::UnknownStage(stage))?;
        if !current.can_transition_to(next) {
            return Err(StateError::InvalidTransition {
                stage,
                from: *current,
                to: next,
            });
        }
        *current = next;
        Ok(())
    }

    /// Write a stage's output into the field it owns. Each field is written
    /// at most once; post content additionally requires both of its inputs.
    pub fn apply_output(&mut self, output: StageOutput) -> Result<(), StateError> {
        let stage = output.stage();
        match output {
            StageOutput::Tone(profile) => {
                write_once(&mut self.tone_profile, profile, stage)?;
            }
            StageOutput::Research(findings) => {
                write_once(&mut self.research_findings, findings, stage)?;
            }
            StageOutput::Content(content) => {
                if self.tone_profile.is_none() {
                    return Err(StateError::PrerequisiteMissing {
                        stage,
                        missing: StageName::Tone,
                    });
                }
                if self.research_findings.is_none() {
                    return Err(StateError::PrerequisiteMissing {
                        stage,
                        missing: StageName::Research,
                    });
                }
                write_once(&mut self.post_content, content, stage)?;
            }
            StageOutput::Image(asset) => {
                write_once(&mut self.post_image, asset, stage)?;
            }
        }
        Ok(())
    }

    /// Append an error. Errors are never removed.
    pub fn record_error(&mut self, error: StageError) {
        self.errors.push(error);
    }

    /// Whether the run was aborted by its caller.
    pub fn was_cancelled(&self) -> bool {
        self.errors.iter().any(|e| e.kind == ErrorKind::Cancelled)
    }

    /// Number of completed stages and total stages.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self
            .stage_statuses
            .values()
            .filter(|s| **s == StageStatus::Completed)
            .count();
        (completed, self.stage_statuses.len())
    }

    /// Derive the run verdict from stage statuses.
    ///
    /// Completed when every stage completed; PartiallyCompleted when the post
    /// text exists but the image stage did not complete; Failed when the run
    /// was cancelled or no post text can be produced.
    pub fn run_state(&self) -> RunState {
        let statuses: Vec<StageStatus> = self.stage_statuses.values().copied().collect();
        if statuses.iter().all(|s| *s == StageStatus::Pending) {
            return RunState::NotStarted;
        }
        if !statuses.iter().all(StageStatus::is_terminal) {
            return RunState::InProgress;
        }
        if self.was_cancelled() {
            return RunState::Failed;
        }
        if statuses.iter().all(|s| *s == StageStatus::Completed) {
            return RunState::Completed;
        }
        let text_ready = [StageName::Tone, StageName::Research, StageName::Content]
            .iter()
            .all(|s| self.status(*s) == Some(StageStatus::Completed));
        if text_ready {
            RunState::PartiallyCompleted
        } else {
            RunState::Failed
        }
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, stage: StageName) -> Result<(), StateError> {
    if slot.is_some() {
        return Err(StateError::AlreadyWritten(stage));
    }
    *slot = Some(value);
    Ok(())
}
