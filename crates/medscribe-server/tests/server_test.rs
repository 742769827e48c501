#![allow(clippy::unwrap_used)]
// End-to-end tests: a bound server with mocked store and model upstreams.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medscribe_api::{GeminiClient, SpeechClient, StoreClient};
use medscribe_core::{
    Assistant, EntitlementService, GenerationSettings, RetryPolicy, StoreBackend,
};
use medscribe_server::{ALLOW_HEADERS, AppState};

// ── Harness ─────────────────────────────────────────────────────────

struct Harness {
    base: String,
    http: reqwest::Client,
    upstream: MockServer,
    shutdown: CancellationToken,
}

impl Harness {
    async fn start() -> Self {
        let upstream = MockServer::start().await;
        let http = reqwest::Client::new();

        let store = StoreClient::from_reqwest(&upstream.uri(), http.clone()).unwrap();
        let backend = StoreBackend::new(store);
        let entitlements = EntitlementService::new(backend.clone(), backend).with_retry(
            RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            },
        );
        let gemini =
            GeminiClient::from_reqwest(&upstream.uri(), http.clone(), "gemini-1.5-flash").unwrap();
        let speech = SpeechClient::from_reqwest(&upstream.uri(), http.clone(), "whisper-1").unwrap();
        let assistant = Assistant::new(Some(gemini), Some(speech), GenerationSettings::default());

        let state = AppState::new(Some(entitlements), assistant);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        tokio::spawn(medscribe_server::serve(listener, state, shutdown.clone()));

        Self {
            base,
            http,
            upstream,
            shutdown,
        }
    }

    async fn post(&self, route: &str, body: Value) -> (u16, Value) {
        let resp = self
            .http
            .post(format!("{}{route}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn mount_subscription(&self, rows: Value) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.upstream)
            .await;
    }

    async fn mount_count(&self, table: &str, total: u32) {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", format!("0-0/{total}").as_str()),
            )
            .mount(&self.upstream)
            .await;
    }

    async fn mount_completion(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            })))
            .mount(&self.upstream)
            .await;
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn expires_in_hours(hours: i64) -> String {
    (Utc::now() + ChronoDuration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ── check-subscription ──────────────────────────────────────────────

#[tokio::test]
async fn test_check_subscription_premium() {
    let h = Harness::start().await;
    h.mount_subscription(json!([{
        "user_id": "u1",
        "plan_type": "yearly",
        "expires_at": expires_in_hours(40),
        "is_active": true
    }]))
    .await;

    let (status, body) = h.post("/check-subscription", json!({ "userId": "u1" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["isSubscribed"], true);
    assert_eq!(body["notificationDue"], true);
    assert_eq!(body["daysRemaining"], 2);
    assert_eq!(body["subscription"]["plan_type"], "yearly");
}

#[tokio::test]
async fn test_check_subscription_none() {
    let h = Harness::start().await;
    h.mount_subscription(json!([])).await;

    let (status, body) = h.post("/check-subscription", json!({ "userId": "u1" })).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "isSubscribed": false,
            "subscription": null,
            "notificationDue": false,
            "daysRemaining": 0
        })
    );
}

#[tokio::test]
async fn test_check_subscription_missing_user_is_400() {
    let h = Harness::start().await;
    let (status, body) = h.post("/check-subscription", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "userId is required");
}

#[tokio::test]
async fn test_check_subscription_store_failure_is_400() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "relation does not exist"
        })))
        .mount(&h.upstream)
        .await;

    let (status, body) = h.post("/check-subscription", json!({ "userId": "u1" })).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("relation does not exist"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let h = Harness::start().await;
    let resp = h
        .http
        .post(format!("{}/check-subscription", h.base))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("invalid JSON body"));
}

// ── entitlement / gate ──────────────────────────────────────────────

#[tokio::test]
async fn test_entitlement_free_tier() {
    let h = Harness::start().await;
    h.mount_subscription(json!([])).await;
    h.mount_count("patients", 1).await;
    h.mount_count("consultations", 0).await;

    let (status, body) = h.post("/entitlement", json!({ "userId": "u1" })).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "isPremium": false,
            "withinLimit": { "patient": false, "consultation": true },
            "notificationDue": false,
            "daysRemaining": 0
        })
    );
}

#[tokio::test]
async fn test_entitlement_store_down_falls_back_to_free_tier() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.upstream)
        .await;

    let (status, body) = h.post("/entitlement", json!({ "userId": "u1" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["isPremium"], false);
    assert_eq!(body["withinLimit"]["patient"], true);
}

#[tokio::test]
async fn test_gate_action() {
    let h = Harness::start().await;
    h.mount_subscription(json!([])).await;
    h.mount_count("patients", 0).await;
    h.mount_count("consultations", 1).await;

    let (_, body) = h
        .post("/gate-action", json!({ "userId": "u1", "resource": "patient" }))
        .await;
    assert_eq!(body, json!({ "allowed": true }));

    let (_, body) = h
        .post("/gate-action", json!({ "userId": "u1", "resource": "consultation" }))
        .await;
    assert_eq!(body, json!({ "allowed": false }));

    let (status, _) = h
        .post("/gate-action", json!({ "userId": "u1", "resource": "invoice" }))
        .await;
    assert_eq!(status, 400);
}

// ── AI proxies ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_with_gemini() {
    let h = Harness::start().await;
    h.mount_completion("Generated answer").await;

    let (status, body) = h
        .post("/generate-with-gemini", json!({ "prompt": "list ACE inhibitors" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "generatedText": "Generated answer" }));
}

#[tokio::test]
async fn test_write_and_enhance() {
    let h = Harness::start().await;
    h.mount_completion("Done").await;

    let (_, body) = h
        .post(
            "/write-with-gemini",
            json!({ "prompt": "shorter", "existingContent": "Long text", "tone": "formal" }),
        )
        .await;
    assert_eq!(body["generatedText"], "Done");

    let (_, body) = h
        .post("/enhance-medical-note", json!({ "noteContent": "pt ok" }))
        .await;
    assert_eq!(body, json!({ "enhancedNote": "Done" }));
}

#[tokio::test]
async fn test_missing_prompt_is_400() {
    let h = Harness::start().await;
    let (status, body) = h.post("/generate-with-gemini", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "prompt is required");

    let (status, _) = h.post("/enhance-medical-note", json!({ "noteType": "SOAP" })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_upstream_error_is_500_with_message() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&h.upstream)
        .await;

    let (status, body) = h
        .post("/generate-with-gemini", json!({ "prompt": "hi" }))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "API key not valid");
}

#[tokio::test]
async fn test_transcribe_audio() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "patient reports" })))
        .mount(&h.upstream)
        .await;

    let audio = STANDARD.encode(vec![7_u8; 70_000]);
    let (status, body) = h.post("/transcribe-audio", json!({ "audio": audio })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "text": "patient reports" }));

    let (status, _) = h.post("/transcribe-audio", json!({ "audio": "@@@" })).await;
    assert_eq!(status, 400);
}

// ── CORS / operational ──────────────────────────────────────────────

#[tokio::test]
async fn test_preflight_and_cors_headers() {
    let h = Harness::start().await;
    let resp = h
        .http
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/transcribe-audio", h.base),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(resp.headers()["access-control-allow-headers"], ALLOW_HEADERS);
    assert!(resp.text().await.unwrap().is_empty());

    let resp = h
        .http
        .post(format!("{}/generate-with-gemini", h.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_healthz_and_unknown_route() {
    let h = Harness::start().await;
    let body: Value = h
        .http
        .get(format!("{}/healthz", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    let (status, body) = h.post("/nope", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn test_oversized_body_uses_error_envelope() {
    let assistant = Assistant::new(None, None, GenerationSettings::default());
    let router = medscribe_server::build_router_with_body_limit(AppState::new(None, assistant), 64);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let resp = reqwest::Client::new()
        .post(format!("{base}/generate-with-gemini"))
        .json(&json!({ "prompt": "x".repeat(1024) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 413);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["error"].as_str().unwrap().contains("length limit"),
        "{body}"
    );

    server.abort();
}
