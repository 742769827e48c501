// ── Core error types ──
//
// Domain errors from medscribe-core. Consumers (CLI, server) never match on
// HTTP status codes or JSON parse failures directly: the
// `From<medscribe_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A record from the store failed validation.
    #[error("Malformed record from store: {message}")]
    InvalidRecord { message: String },

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("{service} is unavailable: {reason}")]
    UpstreamUnavailable { service: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Upstream request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// The upstream-specific error code (e.g. "PGRST116", "INVALID_ARGUMENT").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::UpstreamUnavailable { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                true
            }
            Self::Api {
                status: Some(status),
                ..
            } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<medscribe_api::Error> for CoreError {
    fn from(err: medscribe_api::Error) -> Self {
        use medscribe_api::Error as ApiError;

        match err {
            ApiError::InvalidApiKey { service } => CoreError::AuthenticationFailed {
                message: format!("{service} rejected the configured API key"),
            },
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::UpstreamUnavailable {
                        service: e
                            .url()
                            .and_then(|u| u.host_str().map(str::to_owned))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            ApiError::RateLimited {
                retry_after_secs, ..
            } => CoreError::RateLimited { retry_after_secs },
            ApiError::Upstream {
                service,
                status,
                message,
                code,
            } => {
                if matches!(status, 502..=504) {
                    CoreError::UpstreamUnavailable {
                        service: service.into(),
                        reason: message,
                    }
                } else {
                    CoreError::Api {
                        message,
                        code,
                        status: Some(status),
                    }
                }
            }
            ApiError::EmptyCompletion { service } => CoreError::Api {
                message: format!("{service} returned no text"),
                code: Some("empty_completion".into()),
                status: None,
            },
            ApiError::MissingHeader { header } => CoreError::InvalidRecord {
                message: format!("response is missing the {header} header"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::InvalidRecord { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_upstream_maps_to_unavailable() {
        let err: CoreError = medscribe_api::Error::Upstream {
            service: "store",
            status: 503,
            message: "maintenance".into(),
            code: None,
        }
        .into();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn bad_request_maps_to_api() {
        let err: CoreError = medscribe_api::Error::Upstream {
            service: "gemini",
            status: 400,
            message: "bad".into(),
            code: Some("INVALID_ARGUMENT".into()),
        }
        .into();
        match err {
            CoreError::Api { status, code, .. } => {
                assert_eq!(status, Some(400));
                assert_eq!(code.as_deref(), Some("INVALID_ARGUMENT"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn invalid_key_maps_to_auth() {
        let err: CoreError = medscribe_api::Error::InvalidApiKey { service: "speech" }.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(!err.is_transient());
    }
}
