// ABOUTME: Test utilities for postforge-agent: scripted stub services and a shared call recorder.
// ABOUTME: Lets tests drive the supervisor deterministically without network access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use postforge_core::{ContentRequest, ImageRef, StageName};

use crate::client::Services;
use crate::config::PipelineConfig;
use crate::policy::CallPolicy;
use crate::prompts::TONE_TEMPERATURE;
use crate::service::{
    CompletionRequest, CompletionService, ImageRequest, ImageService, SearchHit, SearchRequest,
    SearchService, ServiceError,
};
use crate::supervisor::Supervisor;

pub const TONE_REPLY: &str = r#"```json
{"tone": "professional", "sentence_length": "medium", "vocabulary": ["data-driven", "collaboration"], "uses_emoji": false, "summary": "A professional, measured voice with technical depth."}
```"#;

pub const POST_REPLY: &str = "Remote work is not about where you sit. It is about how clearly your team communicates.\n\n\n\nData from recent studies shows focused teams ship more with fewer meetings.\n\nWhat do you think? Share your thoughts in the comments.\n#RemoteWork #Productivity #FutureOfWork";

pub const IMAGE_URL: &str = "https://images.example/post.png";

type Hook = Arc<dyn Fn(StageName) + Send + Sync>;

/// Records which stages reached their service, in call order. Optionally
/// runs a hook on every call and holds a set of stages at a rendezvous so
/// tests can prove they were in flight together.
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<StageName>>>,
    hook: Option<Hook>,
    rendezvous: Option<(Arc<Barrier>, Vec<StageName>)>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` synchronously each time a service is called.
    pub fn with_hook(mut self, hook: impl Fn(StageName) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Block each of `stages` on entry until all of them have been called.
    pub fn with_rendezvous(mut self, stages: &[StageName]) -> Self {
        self.rendezvous = Some((Arc::new(Barrier::new(stages.len())), stages.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<StageName> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, stage: StageName) -> usize {
        self.calls().iter().filter(|s| **s == stage).count()
    }

    async fn enter(&self, stage: StageName) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(stage);
        if let Some(hook) = &self.hook {
            hook(stage);
        }
        if let Some((barrier, stages)) = &self.rendezvous
            && stages.contains(&stage)
        {
            barrier.wait().await;
        }
    }
}

/// Completion stub that answers tone requests and content requests from
/// separate scripts, told apart by temperature.
pub struct StubCompletion {
    tone: Result<String, ServiceError>,
    content: Result<String, ServiceError>,
    recorder: CallRecorder,
}

impl StubCompletion {
    pub fn new(recorder: CallRecorder) -> Self {
        Self {
            tone: Ok(TONE_REPLY.to_string()),
            content: Ok(POST_REPLY.to_string()),
            recorder,
        }
    }

    pub fn with_tone(mut self, reply: Result<String, ServiceError>) -> Self {
        self.tone = reply;
        self
    }

    pub fn with_content(mut self, reply: Result<String, ServiceError>) -> Self {
        self.content = reply;
        self
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        if request.temperature == TONE_TEMPERATURE {
            self.recorder.enter(StageName::Tone).await;
            self.tone.clone()
        } else {
            self.recorder.enter(StageName::Content).await;
            self.content.clone()
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

pub struct StubSearch {
    hits: Result<Vec<SearchHit>, ServiceError>,
    recorder: CallRecorder,
}

impl StubSearch {
    pub fn new(recorder: CallRecorder) -> Self {
        Self {
            hits: Ok(sample_hits()),
            recorder,
        }
    }

    pub fn with_hits(mut self, hits: Result<Vec<SearchHit>, ServiceError>) -> Self {
        self.hits = hits;
        self
    }
}

#[async_trait]
impl SearchService for StubSearch {
    async fn search(&self, _request: &SearchRequest) -> Result<Vec<SearchHit>, ServiceError> {
        self.recorder.enter(StageName::Research).await;
        self.hits.clone()
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

/// Image stub. Downloads are not recorded as stage calls.
pub struct StubImages {
    reply: Result<ImageRef, ServiceError>,
    download: Result<Vec<u8>, ServiceError>,
    recorder: CallRecorder,
}

impl StubImages {
    pub fn new(recorder: CallRecorder) -> Self {
        Self {
            reply: Ok(ImageRef::url(IMAGE_URL)),
            download: Ok(png_bytes(1024, 1024)),
            recorder,
        }
    }

    pub fn with_reply(mut self, reply: Result<ImageRef, ServiceError>) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_download(mut self, download: Result<Vec<u8>, ServiceError>) -> Self {
        self.download = download;
        self
    }
}

#[async_trait]
impl ImageService for StubImages {
    async fn generate(&self, _request: &ImageRequest) -> Result<ImageRef, ServiceError> {
        self.recorder.enter(StageName::Image).await;
        self.reply.clone()
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, ServiceError> {
        self.download.clone()
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-image"
    }
}

/// The leading bytes of a PNG file: signature plus an IHDR chunk.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0; 4]);
    bytes
}

pub fn sample_hits() -> Vec<SearchHit> {
    vec![
        SearchHit {
            title: "The state of remote work".to_string(),
            url: "https://research.example/remote".to_string(),
            snippet: "Remote teams report fewer interruptions. Survey of 2,000 workers."
                .to_string(),
        },
        SearchHit {
            title: "Meetings and focus".to_string(),
            url: "https://research.example/meetings".to_string(),
            snippet: "Cutting meetings by a third raised output.".to_string(),
        },
    ]
}

pub fn sample_request() -> ContentRequest {
    ContentRequest::new(
        "I value data-driven decisions and clear communication across distributed teams.",
        "remote work productivity",
    )
}

/// Single attempt, short timeout: stub failures surface immediately.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        call_policy: CallPolicy::single_attempt(Duration::from_secs(5)),
        ..PipelineConfig::default()
    }
}

/// Services whose stubs all report to `recorder`, with default scripts.
pub fn stub_services(recorder: &CallRecorder) -> Services {
    Services {
        completion: Arc::new(StubCompletion::new(recorder.clone())),
        search: Arc::new(StubSearch::new(recorder.clone())),
        images: Arc::new(StubImages::new(recorder.clone())),
    }
}

pub fn stub_supervisor(services: &Services) -> Supervisor {
    Supervisor::from_services(services, &test_config())
}
