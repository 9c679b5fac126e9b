// ABOUTME: The four stage agents behind one Agent enum with a single execute operation.
// ABOUTME: Agents read the workflow state, call one external service, and return a typed outcome.

pub mod content;
pub mod image;
pub mod research;
pub mod tone;

use std::sync::Arc;

use postforge_core::{StageError, StageName, StageOutput, WorkflowState};

use crate::client::Services;
use crate::config::PipelineConfig;
use crate::service::ServiceError;

pub use content::{ContentCreationAgent, MIN_POST_CHARS};
pub use image::ImageGenerationAgent;
pub use research::ResearchAgent;
pub use tone::ToneAnalysisAgent;

/// Result of running one stage. Failures are values; agents never panic
/// or mutate the state.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    Success(StageOutput),
    Failure(StageError),
}

impl AgentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Success(_))
    }
}

impl From<Result<StageOutput, StageError>> for AgentOutcome {
    fn from(result: Result<StageOutput, StageError>) -> Self {
        match result {
            Ok(output) => AgentOutcome::Success(output),
            Err(error) => AgentOutcome::Failure(error),
        }
    }
}

pub enum Agent {
    Tone(ToneAnalysisAgent),
    Research(ResearchAgent),
    Content(ContentCreationAgent),
    Image(ImageGenerationAgent),
}

impl Agent {
    /// One agent per stage, wired to the given services.
    pub fn standard_set(services: &Services, config: &PipelineConfig) -> Vec<Agent> {
        let policy = config.call_policy;
        vec![
            Agent::Tone(ToneAnalysisAgent::new(
                Arc::clone(&services.completion),
                policy,
            )),
            Agent::Research(ResearchAgent::new(
                Arc::clone(&services.search),
                policy,
                config.max_results,
            )),
            Agent::Content(ContentCreationAgent::new(
                Arc::clone(&services.completion),
                policy,
            )),
            Agent::Image(ImageGenerationAgent::new(
                Arc::clone(&services.images),
                policy,
                config.image_size.clone(),
            )),
        ]
    }

    pub fn stage(&self) -> StageName {
        match self {
            Agent::Tone(_) => StageName::Tone,
            Agent::Research(_) => StageName::Research,
            Agent::Content(_) => StageName::Content,
            Agent::Image(_) => StageName::Image,
        }
    }

    pub async fn execute(&self, state: &WorkflowState) -> AgentOutcome {
        let stage = self.stage();
        tracing::info!(stage = %stage, run_id = %state.run_id(), "agent starting");
        let result = match self {
            Agent::Tone(agent) => agent.execute(state).await,
            Agent::Research(agent) => agent.execute(state).await,
            Agent::Content(agent) => agent.execute(state).await,
            Agent::Image(agent) => agent.execute(state).await,
        };
        match &result {
            Ok(_) => tracing::info!(stage = %stage, "agent completed"),
            Err(e) => tracing::warn!(stage = %stage, kind = %e.kind, error = %e.message, "agent failed"),
        }
        result.into()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Agent").field(&self.stage()).finish()
    }
}

/// Record a service failure against the stage that made the call.
pub(crate) fn service_failure(stage: StageName, error: ServiceError) -> StageError {
    StageError::new(stage, error.kind(), error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_core::{ErrorKind, ResearchFindings};

    #[test]
    fn outcome_from_result() {
        let ok: AgentOutcome =
            Ok::<_, StageError>(StageOutput::Research(ResearchFindings::empty("ai"))).into();
        assert!(ok.is_success());

        let err: AgentOutcome =
            Err::<StageOutput, _>(StageError::service(StageName::Image, "down")).into();
        assert!(!err.is_success());
    }

    #[test]
    fn service_failures_keep_their_classification() {
        let err = service_failure(StageName::Tone, ServiceError::RateLimited);
        assert_eq!(err.kind, ErrorKind::Service);
        assert_eq!(err.stage, StageName::Tone);

        let err = service_failure(
            StageName::Tone,
            ServiceError::InvalidResponse("bad".to_string()),
        );
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("bad"));
    }
}
