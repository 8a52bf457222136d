//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use postlens_analysis::{AnalysisError, FileState, FileStore, GeminiClient, Generator, RemoteFile};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", base_url).expect("client construction should not fail")
}

#[tokio::test]
async fn upload_runs_resumable_protocol() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("123.mp4");
    std::fs::write(&file, b"video-bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(query_param("key", "test-key"))
        .and(header("X-Goog-Upload-Protocol", "resumable"))
        .and(header("X-Goog-Upload-Command", "start"))
        .and(header("X-Goog-Upload-Header-Content-Length", "11"))
        .and(header("X-Goog-Upload-Header-Content-Type", "video/mp4"))
        .and(body_partial_json(serde_json::json!({"file": {"display_name": "123.mp4"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-url", format!("{}/upload-session/1", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .and(header("X-Goog-Upload-Offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "file": {
                "name": "files/abc",
                "uri": "https://store/files/abc",
                "mimeType": "video/mp4",
                "state": "PROCESSING"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let remote = client.upload(&file, "video/mp4").await.expect("upload should succeed");

    assert_eq!(remote.name, "files/abc");
    assert_eq!(remote.mime_type, "video/mp4");
    assert_eq!(remote.state, FileState::Processing);
}

#[tokio::test]
async fn upload_without_session_url_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("1.jpg");
    std::fs::write(&file, b"x").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.upload(&file, "image/jpeg").await.unwrap_err();
    assert!(matches!(err, AnalysisError::MissingUploadUrl { .. }));
}

#[tokio::test]
async fn status_maps_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "files/abc", "uri": "https://store/files/abc", "mimeType": "application/pdf", "state": "ACTIVE"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let file = client.status("files/abc").await.expect("status should succeed");
    assert_eq!(file.state, FileState::Active);
}

#[tokio::test]
async fn delete_hits_resource() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.delete("files/abc").await.expect("delete should succeed");
}

#[tokio::test]
async fn generate_sends_files_then_prompt_and_joins_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [
                {"file_data": {"mime_type": "image/jpeg", "file_uri": "https://store/files/a"}},
                {"text": "describe"}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "[{\"media_id\":"}, {"text": " \"1\"}]"}]}}]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let files = vec![RemoteFile {
        name: "files/a".to_owned(),
        uri: "https://store/files/a".to_owned(),
        mime_type: "image/jpeg".to_owned(),
        state: FileState::Active,
    }];
    let text = client
        .generate("gemini-test", &files, "describe")
        .await
        .expect("generate should succeed");
    assert_eq!(text, "[{\"media_id\": \"1\"}]");
}

#[tokio::test]
async fn service_unavailable_is_overload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate("gemini-test", &[], "x").await.unwrap_err();
    assert!(err.is_overload());
    assert!(err.to_string().contains("overloaded"));
}

#[tokio::test]
async fn other_errors_are_not_overload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate("gemini-test", &[], "x").await.unwrap_err();
    assert!(matches!(err, AnalysisError::Api { status: 400, ref message } if message == "API key not valid."));
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn empty_candidates_are_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate("gemini-test", &[], "x").await.unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyResponse));
}
