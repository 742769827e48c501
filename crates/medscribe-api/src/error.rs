use thiserror::Error;

/// Top-level error type for the `medscribe-api` crate.
///
/// Covers every failure mode across the three upstreams: the managed
/// store's REST interface, the generative-AI API, and the speech API.
/// `medscribe-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The upstream rejected our key (HTTP 401/403).
    #[error("Invalid API key for {service}")]
    InvalidApiKey { service: &'static str },

    /// A key could not be turned into a header value.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the upstream. Includes retry-after in seconds.
    #[error("Rate limited by {service} -- retry after {retry_after_secs}s")]
    RateLimited {
        service: &'static str,
        retry_after_secs: u64,
    },

    // ── Upstream ────────────────────────────────────────────────────
    /// Structured non-2xx response from an upstream.
    #[error("{service} error (HTTP {status}): {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The generative model answered without any text.
    #[error("{service} returned no text")]
    EmptyCompletion { service: &'static str },

    /// A response header the protocol requires was absent or malformed.
    #[error("Missing or malformed response header: {header}")]
    MissingHeader { header: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the upstream rejected our credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidApiKey { .. } | Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Upstream { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The HTTP status reported by the upstream, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Extract the upstream error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
