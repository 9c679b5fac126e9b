// ABOUTME: Content creation agent: writes the post from the tone profile, research findings and topic.
// ABOUTME: Hashtags and calls to action are pattern-extracted from the generated text, not requested separately.

use std::sync::Arc;

use postforge_core::{PostContent, StageError, StageName, StageOutput, WorkflowState};

use crate::agents::service_failure;
use crate::policy::CallPolicy;
use crate::prompts;
use crate::service::CompletionService;

const STAGE: StageName = StageName::Content;

/// Shortest post text, after normalization, accepted as usable.
pub const MIN_POST_CHARS: usize = 40;

pub struct ContentCreationAgent {
    completion: Arc<dyn CompletionService>,
    policy: CallPolicy,
}

impl ContentCreationAgent {
    pub fn new(completion: Arc<dyn CompletionService>, policy: CallPolicy) -> Self {
        Self { completion, policy }
    }

    pub async fn execute(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let profile = state
            .tone_profile()
            .ok_or_else(|| StageError::validation(STAGE, "tone profile is missing"))?;
        let findings = state
            .research_findings()
            .ok_or_else(|| StageError::validation(STAGE, "research findings are missing"))?;

        let request = prompts::content_request(profile, findings, state.topic(), state.language());
        let reply = self
            .policy
            .run("content_creation", || self.completion.complete(&request))
            .await
            .map_err(|e| service_failure(STAGE, e))?;

        let content = accept_post(&reply)?;
        tracing::debug!(
            words = content.word_count,
            hashtags = content.hashtags.len(),
            ctas = content.calls_to_action.len(),
            "post generated"
        );
        Ok(StageOutput::Content(content))
    }
}

pub(crate) fn accept_post(reply: &str) -> Result<PostContent, StageError> {
    let content = PostContent::from_generated(reply);
    let length = content.text.chars().count();
    if length < MIN_POST_CHARS {
        return Err(StageError::validation(
            STAGE,
            format!(
                "generated post is too short ({} characters, need at least {})",
                length, MIN_POST_CHARS
            ),
        ));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_core::ErrorKind;

    #[test]
    fn short_or_empty_posts_are_rejected() {
        for reply in ["", "   \n\n  ", "Too short. #AI"] {
            let err = accept_post(reply).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.stage, StageName::Content);
        }
    }

    #[test]
    fn accepted_post_carries_extracted_structure() {
        let content = accept_post(
            "Remote teams ship faster when meetings shrink.\n\n\n\nWhat do you think?\n#RemoteWork #Productivity",
        )
        .unwrap();
        assert_eq!(content.hashtags, vec!["#RemoteWork", "#Productivity"]);
        assert_eq!(content.calls_to_action, vec!["What do you think?"]);
        assert!(!content.text.contains("\n\n\n"));
    }
}
