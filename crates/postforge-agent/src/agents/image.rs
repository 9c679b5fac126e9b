// ABOUTME: Image generation agent: distills a short prompt from the topic and post, then requests one image.
// ABOUTME: Keeps a base64 copy of the result with its format and dimensions, since hosted URLs expire.

use std::sync::Arc;

use postforge_core::{
    ImageAsset, ImageData, ImageRef, StageError, StageName, StageOutput, WorkflowState,
};

use crate::agents::service_failure;
use crate::policy::CallPolicy;
use crate::prompts;
use crate::service::{ImageRequest, ImageService, ServiceError};

const STAGE: StageName = StageName::Image;

pub struct ImageGenerationAgent {
    images: Arc<dyn ImageService>,
    policy: CallPolicy,
    size: String,
}

impl ImageGenerationAgent {
    pub fn new(images: Arc<dyn ImageService>, policy: CallPolicy, size: String) -> Self {
        Self {
            images,
            policy,
            size,
        }
    }

    pub async fn execute(&self, state: &WorkflowState) -> Result<StageOutput, StageError> {
        let post = state
            .post_content()
            .ok_or_else(|| StageError::validation(STAGE, "post content is missing"))?;

        let request = ImageRequest {
            prompt: prompts::image_prompt(state.topic(), &post.text),
            size: self.size.clone(),
        };
        let reference = self
            .policy
            .run("image_generation", || self.images.generate(&request))
            .await
            .map_err(|e| service_failure(STAGE, e))?;

        let data = self.keep_copy(&reference).await;
        tracing::debug!(
            model = self.images.model_name(),
            size = %request.size,
            kept_bytes = ?data.as_ref().map(|d| d.size_bytes),
            "image generated"
        );
        Ok(StageOutput::Image(ImageAsset {
            reference,
            prompt: request.prompt,
            size: request.size,
            data,
        }))
    }

    /// A failed copy leaves the stage successful with only the reference.
    async fn keep_copy(&self, reference: &ImageRef) -> Option<ImageData> {
        let kept = match reference {
            ImageRef::Url { url } => self
                .policy
                .run("image_download", || self.images.download(url))
                .await
                .map(|bytes| ImageData::from_bytes(&bytes)),
            ImageRef::Inline { base64 } => ImageData::from_base64(base64).map_err(|e| {
                ServiceError::InvalidResponse(format!("image data is not base64: {}", e))
            }),
        };

        match kept {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(error = %e, "image generated but its bytes could not be kept");
                None
            }
        }
    }
}
