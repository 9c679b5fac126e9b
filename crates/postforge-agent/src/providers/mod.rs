// ABOUTME: HTTP adapters for the external AI services: OpenAI chat and images, Tavily search.
// ABOUTME: Shares the request plumbing that maps transport failures and HTTP status codes onto ServiceError.

pub mod openai;
pub mod tavily;

use serde_json::Value;

use crate::service::ServiceError;

/// POST a JSON body and decode a JSON reply, classifying every failure.
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    body: &Value,
    credential: &str,
) -> Result<Value, ServiceError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::Transport(format!("HTTP request failed: {}", e)))?;

    check_status(response, credential)
        .await?
        .json()
        .await
        .map_err(|e| ServiceError::InvalidResponse(format!("failed to parse JSON: {}", e)))
}

/// GET a resource and return its raw body.
pub(crate) async fn get_bytes(
    request: reqwest::RequestBuilder,
    credential: &str,
) -> Result<Vec<u8>, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::Transport(format!("HTTP request failed: {}", e)))?;

    let body = check_status(response, credential)
        .await?
        .bytes()
        .await
        .map_err(|e| ServiceError::Transport(format!("failed to read body: {}", e)))?;
    if body.is_empty() {
        return Err(ServiceError::InvalidResponse("empty body".to_string()));
    }
    Ok(body.to_vec())
}

async fn check_status(
    response: reqwest::Response,
    credential: &str,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ServiceError::RateLimited);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ServiceError::Provider(format!(
            "Unauthorized: check {}",
            credential
        )));
    }

    if status.is_server_error() {
        return Err(ServiceError::Server(format!("Server error: {}", status)));
    }

    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Provider(format!(
            "API error {}: {}",
            status, error_body
        )));
    }

    Ok(response)
}

/// Base URLs are accepted with or without a trailing slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
