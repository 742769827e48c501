#![allow(clippy::unwrap_used)]
// `Assistant` against mocked generative-AI and speech endpoints.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medscribe_api::{GeminiClient, SpeechClient};
use medscribe_core::{Assistant, CoreError, GenerationSettings};

const MODEL: &str = "gemini-1.5-flash";
const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

async fn assistant(server: &MockServer) -> Assistant {
    let gemini = GeminiClient::from_reqwest(&server.uri(), reqwest::Client::new(), MODEL).unwrap();
    let speech = SpeechClient::from_reqwest(&server.uri(), reqwest::Client::new(), "whisper-1")
        .unwrap();
    Assistant::new(Some(gemini), Some(speech), GenerationSettings::default())
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn test_enhance_note_sends_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("SOAP note"))
        .and(body_string_contains("pt c/o cough"))
        .respond_with(completion("S: cough"))
        .expect(1)
        .mount(&server)
        .await;

    let text = assistant(&server)
        .await
        .enhance_note("pt c/o cough", None)
        .await
        .unwrap();
    assert_eq!(text, "S: cough");
}

#[tokio::test]
async fn test_write_includes_tone_and_existing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("empathetic tone"))
        .and(body_string_contains("Follow-up in two weeks."))
        .respond_with(completion("Revised."))
        .mount(&server)
        .await;

    let text = assistant(&server)
        .await
        .write("make it warmer", Some("Follow-up in two weeks."), Some("empathetic"))
        .await
        .unwrap();
    assert_eq!(text, "Revised.");
}

#[tokio::test]
async fn test_blank_prompt_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let err = assistant(&server).await.generate("   ").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_upstream_message_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = assistant(&server).await.generate("hello").await.unwrap_err();
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test]
async fn test_transcribe_base64_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(body_string_contains("filename=\"audio.ogg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hello doctor" })))
        .mount(&server)
        .await;

    let payload = format!("data:audio/ogg;base64,{}", STANDARD.encode(b"OggS fake audio"));
    let text = assistant(&server)
        .await
        .transcribe_base64(&payload)
        .await
        .unwrap();
    assert_eq!(text, "hello doctor");
}

#[tokio::test]
async fn test_unconfigured_speech_is_config_error() {
    let assistant = Assistant::new(None, None, GenerationSettings::default());
    let err = assistant.transcribe_base64("aGVsbG8=").await.unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }));
}
