// ABOUTME: Factory that turns a PipelineConfig into the live service adapters.
// ABOUTME: Returns the three shared trait objects the agents call through.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::providers::openai::{OpenAiCompletion, OpenAiImages};
use crate::providers::tavily::TavilySearch;
use crate::service::{CompletionService, ImageService, SearchService};

/// The external capabilities one pipeline needs.
#[derive(Clone)]
pub struct Services {
    pub completion: Arc<dyn CompletionService>,
    pub search: Arc<dyn SearchService>,
    pub images: Arc<dyn ImageService>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("completion", &self.completion.provider_name())
            .field("search", &self.search.provider_name())
            .field("images", &self.images.provider_name())
            .finish()
    }
}

/// Create live OpenAI and Tavily adapters. Fails when either API key is
/// missing.
pub fn create_services(config: &PipelineConfig) -> Result<Services, anyhow::Error> {
    config.require_keys()?;
    let openai_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
    let tavily_key = config
        .tavily_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TAVILY_API_KEY environment variable not set"))?;

    let completion = OpenAiCompletion::new(
        openai_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    );
    let images = OpenAiImages::new(
        openai_key,
        config.openai_base_url.clone(),
        config.openai_image_model.clone(),
    );
    let search = TavilySearch::new(tavily_key, config.tavily_base_url.clone());

    tracing::debug!(
        model = %config.openai_model,
        image_model = %config.openai_image_model,
        "created live services"
    );

    Ok(Services {
        completion: Arc::new(completion),
        search: Arc::new(search),
        images: Arc::new(images),
    })
}
