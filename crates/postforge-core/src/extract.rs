// ABOUTME: Pattern-based text processing for generated posts: normalization, hashtags, calls to action.
// ABOUTME: Also maps topic keywords to suggested hashtags for research findings.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline pattern compiles"));

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern compiles"));

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?\n]+[.!?]*").expect("sentence pattern compiles"));

static CTA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bwhat\b.*\bthink\b.*\?",
        r"(?i)\bshare\b.*\bthoughts\b",
        r"(?i)\blet\b.*\bknow\b",
        r"(?i)\bcomment\b.*\bbelow\b",
        r"(?i)\bwhat\b.*\bexperiences?\b",
        r"(?i)\bhow\b.*\bhandle\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("CTA pattern compiles"))
    .collect()
});

/// Keyword patterns mapped to the hashtags they suggest.
static HASHTAG_TABLE: LazyLock<Vec<(Regex, &'static [&'static str])>> = LazyLock::new(|| {
    let table: [(&str, &'static [&'static str]); 4] = [
        (
            r"\bai\b|artificial intelligence",
            &["#AI", "#ArtificialIntelligence", "#MachineLearning"],
        ),
        (
            r"marketing",
            &["#Marketing", "#DigitalMarketing", "#MarketingStrategy"],
        ),
        (
            r"leadership",
            &["#Leadership", "#Management", "#ProfessionalDevelopment"],
        ),
        (
            r"\bremote\b|work from home",
            &["#RemoteWork", "#WorkFromHome", "#FutureOfWork"],
        ),
    ];
    table
        .into_iter()
        .map(|(p, tags)| (Regex::new(p).expect("keyword pattern compiles"), tags))
        .collect()
});

const MAX_SUGGESTED_HASHTAGS: usize = 5;

/// Fold runs of blank lines, trim, and keep a blank line between body text
/// and a trailing hashtag line.
pub fn normalize_post(raw: &str) -> String {
    let folded = EXCESS_NEWLINES.replace_all(raw.trim(), "\n\n");

    let mut lines: Vec<&str> = Vec::new();
    for line in folded.lines() {
        let is_tag_line = line.trim_start().starts_with('#');
        if is_tag_line
            && let Some(prev) = lines.last()
            && !prev.trim().is_empty()
            && !prev.trim_start().starts_with('#')
        {
            lines.push("");
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Hashtags in order of first appearance, without duplicates.
pub fn hashtags(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in HASHTAG.find_iter(text) {
        let tag = m.as_str().to_string();
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Sentences that invite the reader to respond: anything matching a known
/// CTA phrasing, plus questions in the final body paragraph.
pub fn calls_to_action(text: &str) -> Vec<String> {
    let last_paragraph = last_body_paragraph(text);

    let mut found: Vec<String> = Vec::new();
    for m in SENTENCE.find_iter(text) {
        let sentence = m.as_str().trim();
        if sentence.is_empty() || sentence.starts_with('#') {
            continue;
        }
        let is_cta = CTA_PATTERNS.iter().any(|re| re.is_match(sentence));
        let closing_question = sentence.ends_with('?')
            && m.start() >= last_paragraph.start
            && m.end() <= last_paragraph.end;
        if (is_cta || closing_question) && !found.iter().any(|s| s == sentence) {
            found.push(sentence.to_string());
        }
    }
    found
}

/// Hashtags suggested by keywords in `text`, at most five.
pub fn suggest_hashtags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for (pattern, suggested) in HASHTAG_TABLE.iter() {
        if pattern.is_match(&lower) {
            for tag in suggested.iter() {
                if !tags.iter().any(|t| t == tag) {
                    tags.push((*tag).to_string());
                }
            }
        }
    }
    tags.truncate(MAX_SUGGESTED_HASHTAGS);
    tags
}

/// Byte range of the last paragraph that is not just hashtags.
fn last_body_paragraph(text: &str) -> Range<usize> {
    let mut offset = 0;
    let mut last = 0..0;
    for paragraph in text.split("\n\n") {
        let trimmed = paragraph.trim();
        if !trimmed.is_empty() && !is_hashtag_block(trimmed) {
            last = offset..offset + paragraph.len();
        }
        offset += paragraph.len() + 2;
    }
    last
}

fn is_hashtag_block(paragraph: &str) -> bool {
    paragraph
        .split_whitespace()
        .all(|word| word.starts_with('#'))
}
