// ABOUTME: Core library for postforge: workflow state, execution plan, status events and errors.
// ABOUTME: This crate defines the shared data model the agents and the supervisor operate on.

pub mod error;
pub mod event;
pub mod extract;
pub mod model;
pub mod plan;
pub mod request;
pub mod stage;
pub mod state;

pub use error::{ErrorKind, StageError, ValidationError};
pub use event::{StatusEvent, StatusPayload};
pub use model::{
    ImageAsset, ImageData, ImageRef, Language, PostContent, ResearchFindings, SentenceLength,
    SourceItem, StageOutput, ToneProfile, ToneTraits,
};
pub use plan::{ExecutionPlan, PlanError, PlanNode};
pub use request::ContentRequest;
pub use stage::{RunState, StageName, StageStatus};
pub use state::{StateError, WorkflowState};
