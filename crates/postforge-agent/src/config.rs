// ABOUTME: PipelineConfig: provider endpoints, models, result counts and call policy read from the environment.
// ABOUTME: Every value has a default except the API keys, which are only required for live services.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::policy::CallPolicy;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_image_model: String,
    pub tavily_api_key: Option<String>,
    pub tavily_base_url: String,
    pub max_results: usize,
    pub image_size: String,
    pub call_policy: CallPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_image_model: DEFAULT_OPENAI_IMAGE_MODEL.to_string(),
            tavily_api_key: None,
            tavily_base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            call_policy: CallPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// - `OPENAI_API_KEY`, `TAVILY_API_KEY`: credentials (optional here)
    /// - `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_IMAGE_MODEL`
    /// - `TAVILY_BASE_URL`
    /// - `POSTFORGE_MAX_RESULTS`: search results per run (default 5)
    /// - `POSTFORGE_IMAGE_SIZE`: `WIDTHxHEIGHT` (default 1024x1024)
    /// - `POSTFORGE_TIMEOUT_SECS`, `POSTFORGE_MAX_RETRIES`,
    ///   `POSTFORGE_RETRY_BACKOFF_MS`: per-call policy
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let policy = defaults.call_policy;

        let timeout_secs = env_number("POSTFORGE_TIMEOUT_SECS", policy.timeout.as_secs())?;
        let max_retries = env_number("POSTFORGE_MAX_RETRIES", u64::from(policy.max_retries))?;
        let backoff_ms = env_number(
            "POSTFORGE_RETRY_BACKOFF_MS",
            policy.backoff.as_millis() as u64,
        )?;
        let max_retries = u32::try_from(max_retries).map_err(|_| ConfigError::InvalidNumber {
            var: "POSTFORGE_MAX_RETRIES",
            value: max_retries.to_string(),
        })?;

        Ok(Self {
            openai_api_key: env_nonempty("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", defaults.openai_base_url),
            openai_model: env_or("OPENAI_MODEL", defaults.openai_model),
            openai_image_model: env_or("OPENAI_IMAGE_MODEL", defaults.openai_image_model),
            tavily_api_key: env_nonempty("TAVILY_API_KEY"),
            tavily_base_url: env_or("TAVILY_BASE_URL", defaults.tavily_base_url),
            max_results: env_number("POSTFORGE_MAX_RESULTS", defaults.max_results as u64)?
                as usize,
            image_size: env_or("POSTFORGE_IMAGE_SIZE", defaults.image_size),
            call_policy: CallPolicy::new(
                Duration::from_secs(timeout_secs),
                max_retries,
                Duration::from_millis(backoff_ms),
            ),
        })
    }

    /// Fail with the names of every missing credential.
    pub fn require_keys(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.tavily_api_key.is_none() {
            missing.push("TAVILY_API_KEY");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }
}

fn env_nonempty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(var: &str, default: String) -> String {
    env_nonempty(var).unwrap_or(default)
}

fn env_number(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_nonempty(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
