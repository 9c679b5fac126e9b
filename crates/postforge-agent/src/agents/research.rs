// ABOUTME: Research agent: searches the web for the topic and condenses the hits into findings.
// ABOUTME: No results is a successful, empty finding rather than a failure.

use std::sync::Arc;

use postforge_core::extract::suggest_hashtags;
use postforge_core::{ResearchFindings, SourceItem, StageError, StageName, StageOutput, WorkflowState};

use crate::agents::service_failure;
use crate::policy::CallPolicy;
use crate::service::{SearchRequest, SearchService};

const STAGE: StageName = StageName::Research;

pub struct ResearchAgent {
    search: Arc<dyn SearchService>,
    policy: CallPolicy,
    max_results: usize,
}

impl ResearchAgent {
    pub fn new(search: Arc<dyn SearchService>, policy: CallPolicy, max_results: usize) -> Self {
        Self {
            search,
            policy,
            max_results,
        }
    }

    pub async fn execute(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let topic = state.topic();
        let request = SearchRequest {
            query: topic.to_string(),
            max_results: self.max_results,
        };
        let hits = self
            .policy
            .run("research", || self.search.search(&request))
            .await
            .map_err(|e| service_failure(STAGE, e))?;

        let sources: Vec<SourceItem> = hits
            .into_iter()
            .take(self.max_results)
            .map(SourceItem::from)
            .collect();
        tracing::debug!(provider = self.search.provider_name(), sources = sources.len(), "search finished");

        Ok(StageOutput::Research(condense(topic, sources)))
    }
}

pub(crate) fn condense(topic: &str, sources: Vec<SourceItem>) -> ResearchFindings {
    if sources.is_empty() {
        return ResearchFindings::empty(topic);
    }

    let points: Vec<&str> = sources
        .iter()
        .filter_map(|s| first_sentence(&s.snippet))
        .collect();
    let summary = if points.is_empty() {
        format!("Found {} sources on \"{}\".", sources.len(), topic)
    } else {
        format!("Key points on \"{}\": {}", topic, points.join(" "))
    };

    let mut corpus = topic.to_string();
    for source in &sources {
        corpus.push(' ');
        corpus.push_str(&source.snippet);
    }

    ResearchFindings {
        suggested_hashtags: suggest_hashtags(&corpus),
        sources,
        summary,
    }
}

fn first_sentence(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let end = text
        .char_indices()
        .find(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(text.len());
    Some(&text[..end])
}
