// ABOUTME: The input contract for a run: tone sample, topic and output language.
// ABOUTME: Validation happens here, before any workflow state or status event exists.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::Language;

pub const MIN_TONE_SAMPLE_CHARS: usize = 10;
pub const MIN_TOPIC_CHARS: usize = 3;

/// What the caller asks the pipeline to write about, and in whose voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub tone_sample: String,
    pub topic: String,
    #[serde(default)]
    pub language: Language,
}

impl ContentRequest {
    pub fn new(tone_sample: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            tone_sample: tone_sample.into(),
            topic: topic.into(),
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Check length thresholds on the trimmed inputs and return the trimmed
    /// request. Lengths are counted in characters, not bytes.
    pub fn validate(&self) -> Result<ContentRequest, ValidationError> {
        let tone_sample = self.tone_sample.trim();
        let topic = self.topic.trim();

        let tone_len = tone_sample.chars().count();
        if tone_len < MIN_TONE_SAMPLE_CHARS {
            return Err(ValidationError::ToneSampleTooShort {
                min: MIN_TONE_SAMPLE_CHARS,
                actual: tone_len,
            });
        }

        let topic_len = topic.chars().count();
        if topic_len < MIN_TOPIC_CHARS {
            return Err(ValidationError::TopicTooShort {
                min: MIN_TOPIC_CHARS,
                actual: topic_len,
            });
        }

        Ok(ContentRequest {
            tone_sample: tone_sample.to_string(),
            topic: topic.to_string(),
            language: self.language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inputs_at_threshold() {
        let req = ContentRequest::new("0123456789", "abc");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_short_tone_sample() {
        let err = ContentRequest::new("short", "remote work")
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::ToneSampleTooShort { min: 10, actual: 5 });
    }

    #[test]
    fn rejects_short_topic() {
        let err = ContentRequest::new("I value data-driven decisions.", "x")
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::TopicTooShort { min: 3, actual: 1 });
    }

    #[test]
    fn whitespace_does_not_count_toward_length() {
        let err = ContentRequest::new("   tiny    ", "remote work")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::ToneSampleTooShort { actual: 4, .. }));
    }

    #[test]
    fn validated_request_is_trimmed() {
        let req = ContentRequest::new("  I write plainly and briefly.  ", "  remote work ")
            .with_language(Language::Spanish)
            .validate()
            .unwrap();
        assert_eq!(req.tone_sample, "I write plainly and briefly.");
        assert_eq!(req.topic, "remote work");
        assert_eq!(req.language, Language::Spanish);
    }

    #[test]
    fn multibyte_characters_count_once() {
        // 10 characters, more than 10 bytes
        let req = ContentRequest::new("ññññññññññ", "día");
        assert!(req.validate().is_ok());
    }
}
