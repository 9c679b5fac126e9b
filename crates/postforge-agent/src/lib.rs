// ABOUTME: Agent layer for postforge: service contracts, provider adapters, stage agents and the supervisor.
// ABOUTME: Turns a ContentRequest into a finished WorkflowState by running the execution plan.

pub mod agents;
pub mod client;
pub mod config;
pub mod policy;
pub mod prompts;
pub mod providers;
pub mod service;
pub mod supervisor;
pub mod testing;

pub use agents::{Agent, AgentOutcome};
pub use client::{Services, create_services};
pub use config::{ConfigError, PipelineConfig};
pub use policy::CallPolicy;
pub use service::{
    CompletionRequest, CompletionService, ImageRequest, ImageService, SearchHit, SearchRequest,
    SearchService, ServiceError,
};
pub use supervisor::{PostSummary, RunControl, RunReport, Supervisor};
