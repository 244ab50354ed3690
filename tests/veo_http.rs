//! End-to-end tests of the orchestrator against a mocked Veo HTTP API.
//!
//! No real API key or network access is needed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use stillmotion::{
    AspectRatio, ErrorKind, HttpAssetFetcher, OrchestratorConfig, ProgressEvent, ProgressSink,
    SeedImage, StaticCredential, StillMotionError, VeoService, VideoOrchestrator,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-cred";
const SUBMIT_PATH: &str = "/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning";
const POLL_PATH: &str = "/v1beta/operations/op-1";

#[derive(Default)]
struct RecordedProgress(Mutex<Vec<ProgressEvent>>);

impl ProgressSink for RecordedProgress {
    fn report(&self, event: &ProgressEvent) {
        self.0.lock().unwrap().push(*event);
    }
}

impl RecordedProgress {
    fn events(&self) -> Vec<ProgressEvent> {
        self.0.lock().unwrap().clone()
    }
}

fn orchestrator(server: &MockServer) -> VideoOrchestrator {
    let service = VeoService::builder()
        .base_url(format!("{}/v1beta", server.uri()))
        .build()
        .unwrap();
    VideoOrchestrator::with_config(
        Arc::new(StaticCredential::new(API_KEY)),
        Arc::new(service),
        Arc::new(HttpAssetFetcher::new()),
        OrchestratorConfig::default().with_poll_interval(Duration::from_millis(10)),
    )
}

fn pending() -> serde_json::Value {
    json!({"name": "operations/op-1", "done": false})
}

fn done_with(uri: &str) -> serde_json::Value {
    json!({
        "name": "operations/op-1",
        "done": true,
        "response": {
            "generateVideoResponse": {
                "generatedSamples": [{"video": {"uri": uri}}]
            }
        }
    })
}

fn seed() -> SeedImage {
    SeedImage::from_data_url("data:image/png;base64,AAAA")
}

// The key is sent as `?key=<cred>` on a bare download URI rather than the
// literal `<uri>&key=<cred>` concatenation, which would not be a valid query.
async fn mount_video(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/video123"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_immediate_done_downloads_video() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_partial_json(json!({
            "instances": [{
                "prompt": "A dog running on a beach",
                "image": {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
            }],
            "parameters": {"aspectRatio": "16:9", "resolution": "720p", "numberOfVideos": 1}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(done_with(&format!("{}/video123", server.uri()))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending()))
        .expect(0)
        .mount(&server)
        .await;
    mount_video(&server, 1).await;

    let progress = RecordedProgress::default();
    let video = orchestrator(&server)
        .submit_and_await_video(
            "A dog running on a beach",
            seed(),
            AspectRatio::Landscape,
            &progress,
        )
        .await
        .unwrap();

    assert_eq!(video.data(), &[1, 2, 3]);
    assert_eq!(video.mime_type(), "video/mp4");
    assert_eq!(
        progress.events(),
        vec![ProgressEvent::Submitted, ProgressEvent::Downloading]
    );
}

#[tokio::test]
async fn test_pending_twice_then_done() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLL_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLL_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(done_with(&format!("{}/video123", server.uri()))),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_video(&server, 1).await;

    let progress = RecordedProgress::default();
    let video = orchestrator(&server)
        .submit_and_await_video("waves", seed(), AspectRatio::Portrait, &progress)
        .await
        .unwrap();

    assert_eq!(video.data(), &[1, 2, 3]);
    assert_eq!(video.metadata().status_checks, 2);
    assert_eq!(
        progress.events(),
        vec![
            ProgressEvent::Submitted,
            ProgressEvent::Checking { check: 1 },
            ProgressEvent::Checking { check: 2 },
            ProgressEvent::Downloading,
        ]
    );
}

#[tokio::test]
async fn test_unknown_key_is_credential_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let progress = RecordedProgress::default();
    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &progress)
        .await
        .unwrap_err();

    assert!(err.is_credential_error(), "got: {err:?}");
    assert!(progress.events().is_empty());
}

#[tokio::test]
async fn test_submission_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Unsupported image format."}
        })))
        .mount(&server)
        .await;

    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap_err();

    match err {
        StillMotionError::Submission { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Unsupported image format.");
        }
        other => panic!("Expected Submission error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_done_without_video_skips_download() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": []}}
        })))
        .mount(&server)
        .await;
    mount_video(&server, 0).await;

    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingAsset);
}

#[tokio::test]
async fn test_download_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(done_with(&format!("{}/video123", server.uri()))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/video123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap_err();

    match err {
        StillMotionError::Download { status, message } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "storage unavailable");
            assert!(!message.contains(API_KEY));
        }
        other => panic!("Expected Download error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_operation_error_while_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1",
            "done": true,
            "error": {"code": 8, "message": "Resource has been exhausted"}
        })))
        .mount(&server)
        .await;
    mount_video(&server, 0).await;

    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap_err();

    assert!(
        matches!(err, StillMotionError::GenerationFailed(ref m) if m == "Resource has been exhausted"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_poll_http_failure_is_status_check_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLL_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StatusCheck);
}

async fn download_rejection(status: u16, body: serde_json::Value) -> StillMotionError {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(done_with(&format!("{}/video123", server.uri()))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/video123"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let progress = RecordedProgress::default();
    let result = orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &progress)
        .await;
    assert_eq!(
        progress.events(),
        vec![ProgressEvent::Submitted, ProgressEvent::Downloading]
    );
    match result {
        Ok(video) => panic!("Expected download to fail, got {} bytes", video.size()),
        Err(e) => e,
    }
}

#[tokio::test]
async fn test_download_forbidden_is_credential_error() {
    let err = download_rejection(
        403,
        json!({"error": {"code": 403, "message": "API key not valid"}}),
    )
    .await;

    assert!(err.is_credential_error(), "got: {err:?}");
    assert_eq!(err.kind(), ErrorKind::Credential);
}

#[tokio::test]
async fn test_download_unknown_entity_is_credential_error() {
    let err = download_rejection(
        404,
        json!({"error": {"code": 404, "message": "Requested entity was not found."}}),
    )
    .await;

    assert!(err.is_credential_error(), "got: {err:?}");
}

#[tokio::test]
async fn test_download_sends_key_only_in_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(done_with(&format!("{}/video123", server.uri()))),
        )
        .mount(&server)
        .await;
    mount_video(&server, 1).await;

    orchestrator(&server)
        .submit_and_await_video("p", seed(), AspectRatio::Landscape, &RecordedProgress::default())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let download = requests
        .iter()
        .find(|r| r.url.path() == "/video123")
        .expect("download request");
    assert!(download.headers.get("x-goog-api-key").is_none());
    assert_eq!(download.url.query(), Some("key=test-cred"));
}
