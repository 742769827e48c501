//! HTTP surface for medscribe.
//!
//! Every function route takes a JSON `POST`, answers `OPTIONS` preflight
//! with an empty 200, and carries permissive CORS headers. Failures use a
//! `{ "error": message }` body.

pub mod error;
mod handlers;
mod middleware;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use error::ApiError;
pub use middleware::{ALLOW_HEADERS, ALLOW_ORIGIN};
pub use state::AppState;

/// Largest accepted request body; base64 audio dominates.
pub const MAX_BODY_BYTES: usize = 40 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    build_router_with_body_limit(state, MAX_BODY_BYTES)
}

/// [`build_router`] with a custom request body cap. Oversized bodies get a
/// 413 in the usual `{ "error" }` envelope.
pub fn build_router_with_body_limit(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/check-subscription", post(handlers::check_subscription))
        .route("/entitlement", post(handlers::entitlement))
        .route("/gate-action", post(handlers::gate_action))
        .route("/generate-with-gemini", post(handlers::generate_with_gemini))
        .route("/write-with-gemini", post(handlers::write_with_gemini))
        .route("/enhance-medical-note", post(handlers::enhance_medical_note))
        .route("/transcribe-audio", post(handlers::transcribe_audio))
        .fallback(handlers::not_found)
        .layer(from_fn(middleware::cors_middleware))
        .layer(from_fn(middleware::request_tracing_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "medscribe server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("medscribe server stopped");
    Ok(())
}
