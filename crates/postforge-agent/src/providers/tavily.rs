// ABOUTME: Tavily web search adapter implementing SearchService.
// ABOUTME: Posts the query to /search and maps each result onto a SearchHit.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::providers::{endpoint, post_json};
use crate::service::{SearchHit, SearchRequest, SearchService, ServiceError};

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilySearch {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn build_request_body(&self, request: &SearchRequest) -> Value {
        json!({
            "api_key": self.api_key,
            "query": request.query,
            "max_results": request.max_results,
            "search_depth": "basic"
        })
    }

    /// Convert a `/search` reply into hits. Results missing a URL are
    /// dropped; a reply with no `results` array is malformed.
    pub fn parse_response(response_body: &Value) -> Result<Vec<SearchHit>, ServiceError> {
        let results = response_body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| {
                ServiceError::InvalidResponse("missing results array in response".to_string())
            })?;

        let field = |item: &Value, key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        Ok(results
            .iter()
            .filter_map(|item| {
                let url = field(item, "url");
                if url.is_empty() {
                    return None;
                }
                Some(SearchHit {
                    title: field(item, "title"),
                    url,
                    snippet: field(item, "content"),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SearchService for TavilySearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ServiceError> {
        let body = self.build_request_body(request);
        let url = endpoint(&self.base_url, "/search");
        let response_body = post_json(self.client.post(&url), &body, "TAVILY_API_KEY").await?;
        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "tavily"
    }
}
