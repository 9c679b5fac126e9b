// ABOUTME: Tone analysis agent: asks the completion service for a JSON style profile of the writing sample.
// ABOUTME: Tolerates code fences and surrounding prose; an unparseable reply is a validation failure.

use std::sync::Arc;

use serde::Deserialize;

use postforge_core::{
    SentenceLength, StageError, StageName, StageOutput, ToneProfile, ToneTraits, WorkflowState,
};

use crate::agents::service_failure;
use crate::policy::CallPolicy;
use crate::prompts;
use crate::service::CompletionService;

const STAGE: StageName = StageName::Tone;

pub struct ToneAnalysisAgent {
    completion: Arc<dyn CompletionService>,
    policy: CallPolicy,
}

impl ToneAnalysisAgent {
    pub fn new(completion: Arc<dyn CompletionService>, policy: CallPolicy) -> Self {
        Self { completion, policy }
    }

    pub async fn execute(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let request = prompts::tone_request(state.tone_sample());
        let reply = self
            .policy
            .run("tone_analysis", || self.completion.complete(&request))
            .await
            .map_err(|e| service_failure(STAGE, e))?;

        let profile = parse_profile(&reply)?;
        tracing::debug!(tone = %profile.tone, traits = %profile.summary_line(), "tone profile parsed");
        Ok(StageOutput::Tone(profile))
    }
}

/// Shape of the model's reply. Fields are lenient; the model does not always
/// follow casing or include every key.
#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    tone: String,
    #[serde(default)]
    sentence_length: Option<String>,
    #[serde(default)]
    vocabulary: Vec<String>,
    #[serde(default)]
    uses_emoji: bool,
    #[serde(default)]
    summary: String,
}

pub(crate) fn parse_profile(reply: &str) -> Result<ToneProfile, StageError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| StageError::validation(STAGE, "tone analysis reply contains no JSON object"))?;
    let raw: RawProfile = serde_json::from_str(json).map_err(|e| {
        StageError::validation(STAGE, format!("tone analysis reply is not valid JSON: {}", e))
    })?;

    let tone = raw.tone.trim().to_lowercase();
    if tone.is_empty() {
        return Err(StageError::validation(
            STAGE,
            "tone analysis reply is missing a tone label",
        ));
    }

    let traits = ToneTraits::infer(&format!("{} {}", tone, raw.summary));
    Ok(ToneProfile {
        tone,
        sentence_length: raw
            .sentence_length
            .as_deref()
            .map(parse_sentence_length)
            .unwrap_or_default(),
        vocabulary: raw
            .vocabulary
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        uses_emoji: raw.uses_emoji,
        summary: raw.summary.trim().to_string(),
        traits,
    })
}

fn parse_sentence_length(value: &str) -> SentenceLength {
    match value.trim().to_lowercase().as_str() {
        "short" => SentenceLength::Short,
        "long" => SentenceLength::Long,
        "varied" | "mixed" => SentenceLength::Varied,
        _ => SentenceLength::Medium,
    }
}

/// The outermost `{...}` span of the reply, which also strips code fences.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_core::ErrorKind;

    #[test]
    fn parses_plain_json() {
        let profile = parse_profile(
            r#"{"tone": "Professional", "sentence_length": "Short", "vocabulary": ["data-driven", " "], "uses_emoji": false, "summary": "Formal and measured, with technical depth."}"#,
        )
        .unwrap();
        assert_eq!(profile.tone, "professional");
        assert_eq!(profile.sentence_length, SentenceLength::Short);
        assert_eq!(profile.vocabulary, vec!["data-driven".to_string()]);
        assert_eq!(profile.traits.formality.as_deref(), Some("formal"));
        assert_eq!(profile.traits.energy.as_deref(), Some("moderate"));
        assert_eq!(profile.traits.expertise.as_deref(), Some("high"));
    }

    #[test]
    fn tolerates_code_fences_and_prose() {
        let reply = "Here is the analysis:\n```json\n{\"tone\": \"casual\", \"summary\": \"Chatty.\"}\n```";
        let profile = parse_profile(reply).unwrap();
        assert_eq!(profile.tone, "casual");
        assert_eq!(profile.sentence_length, SentenceLength::Medium);
        assert!(!profile.uses_emoji);
    }

    #[test]
    fn unparseable_reply_is_validation_error() {
        for reply in ["no json here", "{not json}", r#"{"summary": "no tone"}"#] {
            let err = parse_profile(reply).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "reply: {}", reply);
            assert_eq!(err.stage, StageName::Tone);
        }
    }

    #[test]
    fn unknown_sentence_length_defaults_to_medium() {
        assert_eq!(parse_sentence_length("sprawling"), SentenceLength::Medium);
        assert_eq!(parse_sentence_length("Mixed"), SentenceLength::Varied);
    }
}
