// ABOUTME: Prompt builders for the tone, content and image stages.
// ABOUTME: Shared across providers so every backend receives the same instructions.

use postforge_core::{Language, ResearchFindings, ToneProfile};

use crate::service::CompletionRequest;

pub const TONE_TEMPERATURE: f32 = 0.3;
pub const CONTENT_TEMPERATURE: f32 = 0.7;

/// Characters of post text carried into the image prompt.
pub const IMAGE_CONTEXT_CHARS: usize = 100;

const TONE_SYSTEM: &str = "You are a tone analysis expert. Analyze the writing sample and \
describe the author's voice. Reply with a single JSON object and nothing else, using exactly \
these keys: \"tone\" (short label such as professional, casual, enthusiastic), \
\"sentence_length\" (one of short, medium, long, varied), \"vocabulary\" (array of up to five \
characteristic words or phrases), \"uses_emoji\" (boolean), \"summary\" (two or three sentences \
describing formality, energy and expertise).";

const CONTENT_SYSTEM: &str = "You are an expert LinkedIn content creator. Write one engaging \
LinkedIn post that matches the given voice exactly, draws on the research provided, ends with a \
clear call to action or discussion question, and finishes with a line of three to five relevant \
hashtags. Reply with the post text only.";

const IMAGE_REQUIREMENTS: &str = "Requirements: professional, business-appropriate style; \
modern and clean design; high contrast; no text overlay; blues, whites and other professional \
colors; modern illustration or infographic style built on visual metaphors for the topic. \
Avoid overly promotional content and cluttered designs.";

pub fn tone_request(tone_sample: &str) -> CompletionRequest {
    CompletionRequest {
        system_instruction: TONE_SYSTEM.to_string(),
        user_prompt: format!("Writing sample:\n\n{}", tone_sample),
        temperature: TONE_TEMPERATURE,
    }
}

pub fn content_request(
    profile: &ToneProfile,
    findings: &ResearchFindings,
    topic: &str,
    language: Language,
) -> CompletionRequest {
    let user_prompt = format!(
        "Topic: {topic}\n\n\
         Tone profile:\n{tone}\n\n\
         Research:\n{research}\n\n\
         {instruction}",
        topic = topic,
        tone = describe_tone(profile),
        research = describe_research(findings),
        instruction = language.instruction(),
    );
    CompletionRequest {
        system_instruction: CONTENT_SYSTEM.to_string(),
        user_prompt,
        temperature: CONTENT_TEMPERATURE,
    }
}

/// A short image prompt distilled from the topic and the opening of the post.
pub fn image_prompt(topic: &str, post_text: &str) -> String {
    let excerpt: String = post_text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(IMAGE_CONTEXT_CHARS)
        .collect();
    format!(
        "Create a professional LinkedIn image for a post about: {}\n\nContent context: {}\n\n{}",
        topic, excerpt, IMAGE_REQUIREMENTS
    )
}

fn describe_tone(profile: &ToneProfile) -> String {
    let mut lines = vec![
        format!("- tone: {}", profile.tone),
        format!("- sentence length: {:?}", profile.sentence_length).to_lowercase(),
        format!("- emoji: {}", if profile.uses_emoji { "yes" } else { "no" }),
        format!("- characteristics: {}", profile.summary_line()),
    ];
    if !profile.vocabulary.is_empty() {
        lines.push(format!("- vocabulary: {}", profile.vocabulary.join(", ")));
    }
    lines.push(format!("- summary: {}", profile.summary));
    lines.join("\n")
}

fn describe_research(findings: &ResearchFindings) -> String {
    let mut parts = vec![findings.summary.clone()];
    for source in &findings.sources {
        parts.push(format!("- {} ({}): {}", source.title, source.url, source.snippet));
    }
    if !findings.suggested_hashtags.is_empty() {
        parts.push(format!(
            "Relevant hashtags: {}",
            findings.suggested_hashtags.join(" ")
        ));
    }
    parts.join("\n")
}
