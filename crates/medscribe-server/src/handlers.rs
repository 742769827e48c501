// ── Route handlers ──
//
// Bodies are read as raw bytes and decoded here so that malformed JSON gets
// the same `{ "error" }` envelope as every other failure.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use medscribe_core::{EntitlementVerdict, ResourceKind, SubscriptionStatus, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// An unreadable body (including one over the size limit) keeps the
/// rejection's status but uses the `{ "error" }` envelope.
fn parse_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError> {
    let body = body?;
    serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is required")))
}

fn user_id(raw: Option<&str>) -> Result<UserId, ApiError> {
    let raw = required("userId", raw)?;
    UserId::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

// ── Request / response shapes ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRequest {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GateRequest {
    user_id: Option<String>,
    resource: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GateResponse {
    allowed: bool,
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteRequest {
    prompt: Option<String>,
    existing_content: Option<String>,
    tone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceRequest {
    note_content: Option<String>,
    note_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscribeRequest {
    audio: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnhancedNote {
    enhanced_note: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Transcript {
    text: String,
}

// ── Entitlements ─────────────────────────────────────────────────────

pub(crate) async fn check_subscription(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SubscriptionStatus>, ApiError> {
    let req: UserRequest = parse_body(body)?;
    let user = user_id(req.user_id.as_deref())?;

    let status = state
        .entitlements()
        .map_err(|e| ApiError::bad_request(e.message))?
        .check_subscription(&user, Utc::now())
        .await
        .map_err(|e| ApiError::as_bad_request(&e))?;

    debug!(%user, subscribed = status.is_subscribed, "subscription checked");
    Ok(Json(status))
}

pub(crate) async fn entitlement(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EntitlementVerdict>, ApiError> {
    let req: UserRequest = parse_body(body)?;
    let user = user_id(req.user_id.as_deref())?;

    let service = state.entitlements()?;
    let entitlement = service.entitlement(&user, Utc::now()).await?;
    service.notify_if_due(&entitlement);
    Ok(Json(entitlement.verdict))
}

pub(crate) async fn gate_action(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GateResponse>, ApiError> {
    let req: GateRequest = parse_body(body)?;
    let user = user_id(req.user_id.as_deref())?;
    let resource = required("resource", req.resource.as_deref())?;
    let kind: ResourceKind = resource.parse().map_err(|_| {
        ApiError::bad_request(format!(
            "resource must be 'patient' or 'consultation', got '{resource}'"
        ))
    })?;

    let allowed = state
        .entitlements()?
        .gate_action(&user, kind, Utc::now())
        .await?;
    info!(%user, %kind, allowed, "gate evaluated");
    Ok(Json(GateResponse { allowed }))
}

// ── AI proxies ───────────────────────────────────────────────────────

pub(crate) async fn generate_with_gemini(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GeneratedText>, ApiError> {
    let req: PromptRequest = parse_body(body)?;
    let prompt = required("prompt", req.prompt.as_deref())?;
    let generated_text = state.assistant().generate(prompt).await?;
    Ok(Json(GeneratedText { generated_text }))
}

pub(crate) async fn write_with_gemini(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GeneratedText>, ApiError> {
    let req: WriteRequest = parse_body(body)?;
    let prompt = required("prompt", req.prompt.as_deref())?;
    let generated_text = state
        .assistant()
        .write(prompt, req.existing_content.as_deref(), req.tone.as_deref())
        .await?;
    Ok(Json(GeneratedText { generated_text }))
}

pub(crate) async fn enhance_medical_note(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EnhancedNote>, ApiError> {
    let req: EnhanceRequest = parse_body(body)?;
    let note = required("noteContent", req.note_content.as_deref())?;
    let enhanced_note = state
        .assistant()
        .enhance_note(note, req.note_type.as_deref())
        .await?;
    Ok(Json(EnhancedNote { enhanced_note }))
}

pub(crate) async fn transcribe_audio(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Transcript>, ApiError> {
    let req: TranscribeRequest = parse_body(body)?;
    let audio = required("audio", req.audio.as_deref())?;
    let text = state.assistant().transcribe_base64(audio).await?;
    Ok(Json(Transcript { text }))
}

// ── Operational ──────────────────────────────────────────────────────

pub(crate) async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found()
}
