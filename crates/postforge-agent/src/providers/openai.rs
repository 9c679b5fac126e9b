// ABOUTME: OpenAI adapters: chat completions for text and image generations for pictures.
// ABOUTME: Builds request bodies, posts them with reqwest and parses the replies into service results.

use async_trait::async_trait;
use serde_json::{Value, json};

use postforge_core::ImageRef;

use crate::providers::{endpoint, get_bytes, post_json};
use crate::service::{
    CompletionRequest, CompletionService, ImageRequest, ImageService, ServiceError,
};

const MAX_TOKENS: u32 = 1024;
const CREDENTIAL: &str = "OPENAI_API_KEY";

/// Text generation over the Chat Completions API.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build the JSON request body for the Chat Completions API.
    pub fn build_request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_prompt }
            ]
        })
    }

    /// Extract the assistant text from a Chat Completions response.
    pub fn parse_response(response_body: &Value) -> Result<String, ServiceError> {
        let choice = response_body
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                ServiceError::InvalidResponse("missing choices array in response".to_string())
            })?
            .first()
            .ok_or_else(|| ServiceError::InvalidResponse("empty choices array".to_string()))?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ServiceError::InvalidResponse("missing message content in choice".to_string())
            })?;

        if content.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(
                "empty message content".to_string(),
            ));
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        let body = self.build_request_body(request);
        let url = endpoint(&self.base_url, "/v1/chat/completions");
        let builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));

        let response_body = post_json(builder, &body, CREDENTIAL).await?;
        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Image generation over the Images API.
pub struct OpenAiImages {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiImages {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn build_request_body(&self, request: &ImageRequest) -> Value {
        json!({
            "model": self.model,
            "prompt": request.prompt,
            "size": request.size,
            "quality": "standard",
            "n": 1
        })
    }

    /// Read the first image from the response, preferring a hosted URL over
    /// inline base64 data.
    pub fn parse_response(response_body: &Value) -> Result<ImageRef, ServiceError> {
        let first = response_body
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .ok_or_else(|| ServiceError::InvalidResponse("missing image data".to_string()))?;

        if let Some(url) = first.get("url").and_then(|u| u.as_str())
            && !url.is_empty()
        {
            return Ok(ImageRef::url(url));
        }

        if let Some(b64) = first.get("b64_json").and_then(|b| b.as_str())
            && !b64.is_empty()
        {
            return Ok(ImageRef::Inline {
                base64: b64.to_string(),
            });
        }

        Err(ServiceError::InvalidResponse(
            "image entry has neither url nor b64_json".to_string(),
        ))
    }
}

#[async_trait]
impl ImageService for OpenAiImages {
    async fn generate(&self, request: &ImageRequest) -> Result<ImageRef, ServiceError> {
        let body = self.build_request_body(request);
        let url = endpoint(&self.base_url, "/v1/images/generations");
        let builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));

        let response_body = post_json(builder, &body, CREDENTIAL).await?;
        Self::parse_response(&response_body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        // Hosted image URLs are pre-signed; the API key is not sent.
        get_bytes(self.client.get(url), "the image URL signature").await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
