// ABOUTME: Payload types produced by the four stages: tone profile, research findings, post content, image asset.
// ABOUTME: StageOutput wraps them so the supervisor can route each result to the field its stage owns.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::extract;
use crate::stage::StageName;

/// Output language for generated text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }

    /// Parse an ISO 639-1 code or an English name.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "es" | "spanish" | "español" | "espanol" => Some(Language::Spanish),
            _ => None,
        }
    }

    /// Instruction appended to completion prompts.
    pub fn instruction(&self) -> &'static str {
        match self {
            Language::English => "Write your entire response in English.",
            Language::Spanish => "Escribe toda tu respuesta en español.",
        }
    }
}

/// How long the author's sentences tend to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceLength {
    Short,
    #[default]
    Medium,
    Long,
    Varied,
}

/// Coarse traits inferred from the wording of a tone analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneTraits {
    pub formality: Option<String>,
    pub energy: Option<String>,
    pub expertise: Option<String>,
}

impl ToneTraits {
    /// Keyword scan over free-form analysis text. Traits with no matching
    /// keyword stay `None`.
    pub fn infer(text: &str) -> Self {
        let lower = text.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let formality = if any(&["formal", "professional", "business"]) {
            Some("formal")
        } else if any(&["casual", "informal", "conversational"]) {
            Some("casual")
        } else {
            None
        };

        let energy = if any(&["energetic", "enthusiastic", "excited"]) {
            Some("high")
        } else if any(&["calm", "measured", "steady"]) {
            Some("moderate")
        } else {
            None
        };

        let expertise = if any(&["expert", "technical", "authoritative"]) {
            Some("high")
        } else if any(&["beginner", "learning", "accessible"]) {
            Some("accessible")
        } else {
            None
        };

        Self {
            formality: formality.map(String::from),
            energy: energy.map(String::from),
            expertise: expertise.map(String::from),
        }
    }

    fn known(&self) -> Vec<(&'static str, &str)> {
        [
            ("formality", self.formality.as_deref()),
            ("energy", self.energy.as_deref()),
            ("expertise", self.expertise.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

/// Structured description of the author's writing style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    pub tone: String,
    #[serde(default)]
    pub sentence_length: SentenceLength,
    #[serde(default)]
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub uses_emoji: bool,
    pub summary: String,
    #[serde(default)]
    pub traits: ToneTraits,
}

impl ToneProfile {
    /// One-line rendering of the known traits, e.g. `formality: formal; energy: high`.
    pub fn summary_line(&self) -> String {
        let parts: Vec<String> = self
            .traits
            .known()
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        if parts.is_empty() {
            format!("tone: {}", self.tone)
        } else {
            parts.join("; ")
        }
    }
}

/// A single web search result kept as research evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Everything the research stage learned about the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub sources: Vec<SourceItem>,
    pub summary: String,
    #[serde(default)]
    pub suggested_hashtags: Vec<String>,
}

impl ResearchFindings {
    /// Findings with no sources. Absence of data is not an error.
    pub fn empty(topic: &str) -> Self {
        Self {
            sources: Vec::new(),
            summary: format!("No web sources were found for \"{}\".", topic),
            suggested_hashtags: extract::suggest_hashtags(topic),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn summary_line(&self) -> String {
        match self.sources.len() {
            0 => "No sources found".to_string(),
            1 => "Found 1 source".to_string(),
            n => format!("Found {} sources", n),
        }
    }
}

/// The generated post and the structure extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub text: String,
    pub hashtags: Vec<String>,
    pub calls_to_action: Vec<String>,
    pub word_count: usize,
}

impl PostContent {
    /// Normalize generated text and extract hashtags and calls to action by
    /// pattern matching.
    pub fn from_generated(raw: &str) -> Self {
        let text = extract::normalize_post(raw);
        let hashtags = extract::hashtags(&text);
        let calls_to_action = extract::calls_to_action(&text);
        let word_count = text.split_whitespace().count();
        Self {
            text,
            hashtags,
            calls_to_action,
            word_count,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Generated {} word post with {} hashtags",
            self.word_count,
            self.hashtags.len()
        )
    }
}

/// Where the generated image lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageRef {
    Url { url: String },
    Inline { base64: String },
}

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        ImageRef::Url { url: url.into() }
    }
}

/// Image bytes kept with the run, base64 encoded, so the result outlives
/// the provider's expiring URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub base64: String,
    pub size_bytes: usize,
    /// `WIDTHxHEIGHT` read from the file header, when the format allows it.
    pub dimensions: Option<String>,
    pub format: String,
}

impl ImageData {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let (format, dimensions) = sniff_image(bytes);
        Self {
            base64: BASE64.encode(bytes),
            size_bytes: bytes.len(),
            dimensions: dimensions.map(|(w, h)| format!("{}x{}", w, h)),
            format: format.to_string(),
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::from_bytes(&BASE64.decode(encoded.trim())?))
    }

    /// Decoded image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.base64)
    }
}

fn sniff_image(bytes: &[u8]) -> (&'static str, Option<(u32, u32)>) {
    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    if bytes.starts_with(PNG_SIGNATURE) {
        let dimensions = (bytes.len() >= 24 && &bytes[12..16] == b"IHDR").then(|| {
            (
                u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
                u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
            )
        });
        return ("PNG", dimensions);
    }
    if bytes.starts_with(b"GIF8") {
        let dimensions = (bytes.len() >= 10).then(|| {
            (
                u32::from(u16::from_le_bytes([bytes[6], bytes[7]])),
                u32::from(u16::from_le_bytes([bytes[8], bytes[9]])),
            )
        });
        return ("GIF", dimensions);
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return ("JPEG", None);
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return ("WEBP", None);
    }
    ("unknown", None)
}

/// A generated image plus the prompt that produced it, kept for auditing.
/// `data` is absent when the image could not be fetched after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub reference: ImageRef,
    pub prompt: String,
    pub size: String,
    #[serde(default)]
    pub data: Option<ImageData>,
}

impl ImageAsset {
    pub fn summary_line(&self) -> String {
        match &self.data {
            Some(data) => format!(
                "Generated {} {} image for the post ({} bytes)",
                data.dimensions.as_deref().unwrap_or(&self.size),
                data.format,
                data.size_bytes
            ),
            None => format!("Generated {} image for the post", self.size),
        }
    }
}

/// A successful stage result, tagged with the field it writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "output", rename_all = "snake_case")]
pub enum StageOutput {
    Tone(ToneProfile),
    Research(ResearchFindings),
    Content(PostContent),
    Image(ImageAsset),
}

impl StageOutput {
    /// The stage that owns this output.
    pub fn stage(&self) -> StageName {
        match self {
            StageOutput::Tone(_) => StageName::Tone,
            StageOutput::Research(_) => StageName::Research,
            StageOutput::Content(_) => StageName::Content,
            StageOutput::Image(_) => StageName::Image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_inferred_from_keywords() {
        let traits = ToneTraits::infer("A professional, measured voice with technical depth.");
        assert_eq!(traits.formality.as_deref(), Some("formal"));
        assert_eq!(traits.energy.as_deref(), Some("moderate"));
        assert_eq!(traits.expertise.as_deref(), Some("high"));

        let unknown = ToneTraits::infer("Short sentences.");
        assert_eq!(unknown, ToneTraits::default());
    }

    #[test]
    fn tone_summary_line_lists_known_traits() {
        let profile = ToneProfile {
            tone: "casual".to_string(),
            sentence_length: SentenceLength::Short,
            vocabulary: vec![],
            uses_emoji: true,
            summary: "Chatty".to_string(),
            traits: ToneTraits {
                formality: Some("casual".to_string()),
                energy: Some("high".to_string()),
                expertise: None,
            },
        };
        assert_eq!(profile.summary_line(), "formality: casual; energy: high");

        let bare = ToneProfile {
            traits: ToneTraits::default(),
            ..profile
        };
        assert_eq!(bare.summary_line(), "tone: casual");
    }

    #[test]
    fn tone_profile_deserializes_with_defaults() {
        let profile: ToneProfile =
            serde_json::from_str(r#"{"tone": "professional", "summary": "Clear and direct."}"#)
                .unwrap();
        assert_eq!(profile.sentence_length, SentenceLength::Medium);
        assert!(profile.vocabulary.is_empty());
        assert!(!profile.uses_emoji);
    }

    #[test]
    fn empty_findings_are_not_an_error_value() {
        let findings = ResearchFindings::empty("remote work productivity");
        assert!(findings.is_empty());
        assert!(findings.summary.contains("remote work productivity"));
        assert!(findings.suggested_hashtags.contains(&"#RemoteWork".to_string()));
        assert_eq!(findings.summary_line(), "No sources found");
    }

    #[test]
    fn language_codes_round_trip() {
        assert_eq!(Language::from_code("ES"), Some(Language::Spanish));
        assert_eq!(Language::from_code("english"), Some(Language::English));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::Spanish.code(), "es");
    }

    #[test]
    fn stage_output_reports_owner() {
        let out = StageOutput::Image(ImageAsset {
            reference: ImageRef::url("https://img.example/1.png"),
            prompt: "p".to_string(),
            size: "1024x1024".to_string(),
            data: None,
        });
        assert_eq!(out.stage(), StageName::Image);
    }

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn image_data_reads_png_header() {
        let bytes = png_header(1024, 768);
        let data = ImageData::from_bytes(&bytes);
        assert_eq!(data.format, "PNG");
        assert_eq!(data.dimensions.as_deref(), Some("1024x768"));
        assert_eq!(data.size_bytes, bytes.len());
        assert_eq!(data.bytes().unwrap(), bytes);
    }

    #[test]
    fn image_data_detects_other_formats() {
        let gif = ImageData::from_bytes(b"GIF89a\x40\x01\xf0\x00rest");
        assert_eq!(gif.format, "GIF");
        assert_eq!(gif.dimensions.as_deref(), Some("320x240"));

        let jpeg = ImageData::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 16]);
        assert_eq!(jpeg.format, "JPEG");
        assert_eq!(jpeg.dimensions, None);

        let unknown = ImageData::from_bytes(b"hello");
        assert_eq!(unknown.format, "unknown");
        assert_eq!(unknown.base64, "aGVsbG8=");
    }

    #[test]
    fn image_data_from_base64() {
        assert_eq!(ImageData::from_base64("aGVsbG8=\n").unwrap().size_bytes, 5);
        assert!(ImageData::from_base64("not base64!").is_err());
    }

    #[test]
    fn image_summary_reports_kept_data() {
        let mut asset = ImageAsset {
            reference: ImageRef::url("https://img.example/1.png"),
            prompt: "p".to_string(),
            size: "1024x1024".to_string(),
            data: None,
        };
        assert_eq!(asset.summary_line(), "Generated 1024x1024 image for the post");

        asset.data = Some(ImageData::from_bytes(&png_header(1024, 1024)));
        assert_eq!(
            asset.summary_line(),
            "Generated 1024x1024 PNG image for the post (33 bytes)"
        );
    }
}
