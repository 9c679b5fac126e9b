// ABOUTME: End-to-end smoke test for a full postforge run over stub services.
// ABOUTME: Drives the supervisor from request to summary and checks the JSON the CLI would print.

use std::sync::Arc;

use postforge_agent::testing::{
    CallRecorder, IMAGE_URL, StubImages, stub_services, stub_supervisor,
};
use postforge_agent::{RunControl, ServiceError, Services};
use postforge_core::{ContentRequest, Language, RunState, StatusPayload};

fn request() -> ContentRequest {
    ContentRequest::new(
        "  I keep things practical: short updates, real numbers, and an open question for the team.  ",
        "  remote work productivity ",
    )
    .with_language(Language::Spanish)
}

#[tokio::test]
async fn smoke_test_full_run() {
    let recorder = CallRecorder::new();
    let supervisor = stub_supervisor(&stub_services(&recorder));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    // 1. Run the whole pipeline with a live event channel
    let report = supervisor
        .run_with(&request(), RunControl::with_events(tx))
        .await
        .unwrap();
    assert_eq!(report.state, RunState::Completed);

    // 2. Inputs are stored trimmed and with the requested language
    assert_eq!(report.workflow.topic(), "remote work productivity");
    assert_eq!(report.workflow.language(), Language::Spanish);

    // 3. Streamed events end with the verdict
    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last.map(|e| e.payload),
        Some(StatusPayload::RunFinished {
            state: RunState::Completed
        })
    ));

    // 4. Summary serializes to the JSON shape the CLI prints
    let json = serde_json::to_value(report.summary()).unwrap();
    assert_eq!(json["state"], "completed");
    assert_eq!(json["image"]["type"], "url");
    assert_eq!(json["image"]["url"], IMAGE_URL);
    assert_eq!(json["image_data"]["format"], "PNG");
    assert_eq!(json["image_data"]["dimensions"], "1024x1024");
    assert!(!json["image_data"]["base64"].as_str().unwrap().is_empty());
    assert!(json["text"].as_str().unwrap().contains("#RemoteWork"));
    assert!(json["hashtags"].as_array().unwrap().len() >= 2);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn smoke_test_partial_run_keeps_post() {
    let recorder = CallRecorder::new();
    let services = Services {
        images: Arc::new(
            StubImages::new(recorder.clone()).with_reply(Err(ServiceError::RateLimited)),
        ),
        ..stub_services(&recorder)
    };

    let report = stub_supervisor(&services).run(&request()).await.unwrap();
    assert_eq!(report.state, RunState::PartiallyCompleted);

    let summary = report.summary();
    assert!(summary.text.is_some());
    assert!(summary.image.is_none());
    assert_eq!(summary.errors.len(), 1);
    assert!(report.state.has_usable_output());
}
