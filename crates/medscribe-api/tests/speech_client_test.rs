#![allow(clippy::unwrap_used)]
// Integration tests for `SpeechClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medscribe_api::{Error, SpeechClient, TransportConfig};

#[tokio::test]
async fn test_transcribe_uploads_multipart() {
    let server = MockServer::start().await;
    let key = SecretString::from("sk-test".to_string());
    let client =
        SpeechClient::from_api_key(&server.uri(), &key, "whisper-1", &TransportConfig::default())
            .unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("name=\"model\""))
        .and(body_string_contains("whisper-1"))
        .and(body_string_contains("filename=\"audio.webm\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "text": "Patient reports mild headache." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transcription = client
        .transcribe(b"fake-audio".to_vec(), "audio.webm", "audio/webm")
        .await
        .unwrap();

    assert_eq!(transcription.text, "Patient reports mild headache.");
}

#[tokio::test]
async fn test_transcribe_error_passthrough() {
    let server = MockServer::start().await;
    let client =
        SpeechClient::from_reqwest(&server.uri(), reqwest::Client::new(), "whisper-1").unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid file format.",
                "type": "invalid_request_error",
                "code": null
            }
        })))
        .mount(&server)
        .await;

    match client.transcribe(vec![0, 1, 2], "audio.webm", "audio/webm").await {
        Err(Error::Upstream {
            status,
            ref message,
            ..
        }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid file format.");
        }
        other => panic!("expected Upstream error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_transcribe_forbidden() {
    let server = MockServer::start().await;
    let client =
        SpeechClient::from_reqwest(&server.uri(), reqwest::Client::new(), "whisper-1").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.transcribe(vec![1], "audio.webm", "audio/webm").await;
    assert!(
        matches!(result, Err(Error::InvalidApiKey { service: "speech" })),
        "expected InvalidApiKey, got: {result:?}"
    );
}
