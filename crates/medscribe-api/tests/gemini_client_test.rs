#![allow(clippy::unwrap_used)]
// Integration tests for `GeminiClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medscribe_api::gemini_types::GenerationConfig;
use medscribe_api::{Error, GeminiClient, TransportConfig};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

async fn setup() -> (MockServer, GeminiClient) {
    let server = MockServer::start().await;
    let client =
        GeminiClient::from_reqwest(&server.uri(), reqwest::Client::new(), "gemini-1.5-flash")
            .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_generate_text() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Summarize hypertension" }] }],
            "generationConfig": { "maxOutputTokens": 512 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hypertension is..." }] },
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;

    let config = GenerationConfig {
        max_output_tokens: Some(512),
        ..GenerationConfig::default()
    };
    let text = client
        .generate_text("Summarize hypertension", &config)
        .await
        .unwrap();

    assert_eq!(text, "Hypertension is...");
}

#[tokio::test]
async fn test_api_key_header() {
    let server = MockServer::start().await;
    let key = SecretString::from("g-key".to_string());
    let client = GeminiClient::from_api_key(
        &server.uri(),
        &key,
        "gemini-1.5-flash",
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client
        .generate_text("ping", &GenerationConfig::default())
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn test_empty_candidates() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let result = client
        .generate_text("blocked", &GenerationConfig::default())
        .await;
    assert!(
        matches!(result, Err(Error::EmptyCompletion { service: "gemini" })),
        "expected EmptyCompletion, got: {result:?}"
    );
}

#[tokio::test]
async fn test_error_envelope_passthrough() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    match client.generate_text("x", &GenerationConfig::default()).await {
        Err(Error::Upstream {
            service,
            status,
            ref message,
            ref code,
        }) => {
            assert_eq!(service, "gemini");
            assert_eq!(status, 400);
            assert!(message.starts_with("API key not valid"));
            assert_eq!(code.as_deref(), Some("INVALID_ARGUMENT"));
        }
        other => panic!("expected Upstream error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let result = client.generate_text("x", &GenerationConfig::default()).await;
    assert!(
        matches!(
            result,
            Err(Error::RateLimited {
                retry_after_secs: 7,
                ..
            })
        ),
        "expected RateLimited, got: {result:?}"
    );
}
