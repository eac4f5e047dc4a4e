use std::time::Duration;

use assert_matches::assert_matches;
use lumen_core::backend::{BackendError, GenerationBackend, GenerationRequest};
use lumen_core::media::{MediaArtifact, MediaKind};
use lumen_core::provider_config::ProviderConfig;
use lumen_core::task::{TaskKind, VideoConfig};
use lumen_provider::OpenAiCompatBackend;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// PNG-ish bytes "hello" -> aGVsbG8=
const HELLO_B64: &str = "aGVsbG8=";

fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        name: "test".into(),
        base_url: format!("{}/", server.uri()),
        api_key: "sk-test-key".into(),
        image_model: "image-model".into(),
        video_model: "video-model".into(),
        proxy: None,
    }
}

fn backend() -> OpenAiCompatBackend {
    OpenAiCompatBackend::new().with_download_retry(3, Duration::from_millis(10))
}

fn image_request(count: u32) -> GenerationRequest {
    GenerationRequest {
        kind: TaskKind::Image,
        prompt: "a lighthouse at dusk".into(),
        count,
        video_config: None,
        source_image: None,
    }
}

fn video_request() -> GenerationRequest {
    GenerationRequest {
        kind: TaskKind::Video,
        prompt: "waves rolling in".into(),
        count: 1,
        video_config: None,
        source_image: None,
    }
}

fn b64_batch(n: usize) -> serde_json::Value {
    json!({ "data": (0..n).map(|_| json!({ "b64_json": HELLO_B64 })).collect::<Vec<_>>() })
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[tokio::test]
async fn images_are_requested_in_batches_of_two() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_string_contains("\"n\":2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(b64_batch(2)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_string_contains("\"n\":1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(b64_batch(1)))
        .expect(1)
        .mount(&server)
        .await;

    let artifacts = backend()
        .generate(&config(&server), &image_request(5))
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 5);
    for artifact in &artifacts {
        assert_eq!(artifact.kind, MediaKind::Image);
        assert_eq!(artifact.extension, "png");
        assert_eq!(artifact.bytes, b"hello");
    }
}

#[tokio::test]
async fn non_200_becomes_api_error_with_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "invalid api key" } })),
        )
        .mount(&server)
        .await;

    let err = backend()
        .generate(&config(&server), &image_request(1))
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::Api { status: 401, ref message } if message == "invalid api key");
}

#[tokio::test]
async fn error_in_200_body_is_not_retried_as_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": { "message": "blocked" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = backend()
        .generate(&config(&server), &image_request(1))
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::Provider(ref msg) if msg == "blocked");
}

#[tokio::test]
async fn unusable_b64_response_falls_back_to_url_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_string_contains("\"response_format\":\"b64_json\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "revised_prompt": "x" }] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_string_contains("\"response_format\":\"url\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url": format!("{}/files/out.png", server.uri()) }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/out.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"png-bytes".to_vec()),
        )
        .mount(&server)
        .await;

    let artifacts = backend()
        .generate(&config(&server), &image_request(1))
        .await
        .unwrap();

    assert_eq!(artifacts, vec![MediaArtifact::new(MediaKind::Image, "png", b"png-bytes".to_vec())]);
}

#[tokio::test]
async fn url_inside_b64_field_is_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "b64_json": format!("{}/files/a", server.uri()) }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"jpeg".to_vec()),
        )
        .mount(&server)
        .await;

    let artifacts = backend()
        .generate(&config(&server), &image_request(1))
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].extension, "jpg");
}

#[tokio::test]
async fn later_batch_failure_returns_partial_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(b64_batch(2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let artifacts = backend()
        .generate(&config(&server), &image_request(4))
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 2);
}

#[tokio::test]
async fn first_batch_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = backend()
        .generate(&config(&server), &image_request(4))
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::Api { status: 500, ref message } if message == "upstream down");
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

#[tokio::test]
async fn video_is_downloaded_after_not_ready_responses() {
    let server = MockServer::start().await;
    let video_url = format!("{}/videos/v1.mp4", server.uri());
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"model\":\"video-model\""))
        .and(body_string_contains("\"video_config\":{}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": format!("Here you go: {video_url}") } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/v1.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/v1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/v1.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(vec![7u8; 4096]),
        )
        .mount(&server)
        .await;

    let artifacts = backend()
        .generate(&config(&server), &video_request())
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].kind, MediaKind::Video);
    assert_eq!(artifacts[0].extension, "mp4");
    assert_eq!(artifacts[0].bytes.len(), 4096);
}

#[tokio::test]
async fn video_download_gives_up_after_configured_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "url": format!("{}/videos/never.webm", server.uri()) } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/never.webm"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let err = backend()
        .generate(&config(&server), &video_request())
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::Download(ref msg) if msg.contains("3 attempts"));
}

#[tokio::test]
async fn image_to_video_sends_data_url_and_video_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("data:image/png;base64,aGVsbG8="))
        .and(body_string_contains("Animate this image"))
        .and(body_string_contains("\"aspect_ratio\":\"16:9\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}/v.webm\"}}}}]}}\n\ndata: [DONE]\n",
            server.uri()
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v.webm"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2000]))
        .mount(&server)
        .await;

    let request = GenerationRequest {
        prompt: String::new(),
        video_config: Some(VideoConfig {
            aspect_ratio: Some("16:9".into()),
            ..VideoConfig::default()
        }),
        source_image: Some(MediaArtifact::new(MediaKind::Image, "png", b"hello".to_vec())),
        ..video_request()
    };

    let artifacts = backend().generate(&config(&server), &request).await.unwrap();

    assert_eq!(artifacts[0].extension, "webm");
}

#[tokio::test]
async fn video_response_without_url_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "I cannot make that video." } }]
        })))
        .mount(&server)
        .await;

    let err = backend()
        .generate(&config(&server), &video_request())
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::InvalidResponse(_));
}
