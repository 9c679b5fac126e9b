// ABOUTME: Contracts for the three external AI capabilities: text completion, web search, image generation.
// ABOUTME: Each is an async trait returning Result, so adapters and test stubs are interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use postforge_core::{ErrorKind, ImageRef, SourceItem};

/// Errors that can occur while talking to an external service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Non-retryable provider failure (bad credentials, 4xx, bad request).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Connection-level failure before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered, but the body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Transient conditions that a bounded retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::Transport(_)
                | ServiceError::Server(_)
                | ServiceError::RateLimited
                | ServiceError::Timeout(_)
        )
    }

    /// How this failure is classified on the workflow state.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidResponse(_) => ErrorKind::Validation,
            _ => ErrorKind::Service,
        }
    }
}

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub temperature: f32,
}

/// A web search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl From<SearchHit> for SourceItem {
    fn from(hit: SearchHit) -> Self {
        SourceItem {
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
        }
    }
}

/// An image generation request. `size` is a `WIDTHxHEIGHT` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: String,
}

/// Text completion backend used by the tone and content stages.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate text for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError>;

    /// Provider name for logging and display (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Model identifier being used.
    fn model_name(&self) -> &str;
}

/// Web search backend used by the research stage.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ServiceError>;

    fn provider_name(&self) -> &str;
}

/// Image generation backend used by the image stage.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<ImageRef, ServiceError>;

    /// Fetch the bytes behind a hosted image URL. Hosted URLs expire, so the
    /// image stage keeps a copy.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}
