//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use medscribe_config::ConfigError;
use medscribe_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const UPSTREAM: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{service} is unavailable")]
    #[diagnostic(
        code(medscribe::connection_failed),
        help("Check the configured URL and your network.\nReason: {reason}")
    )]
    ConnectionFailed { service: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(medscribe::auth_failed),
        help(
            "Verify the API keys of the active profile.\n\
             Run: medscribe config set-key <store|gemini|speech>"
        )
    )]
    AuthFailed { message: String },

    #[error("No {credential} key configured for profile '{profile}'")]
    #[diagnostic(
        code(medscribe::no_credentials),
        help(
            "Store one with: medscribe config set-key {credential}\n\
             Or set the {env} environment variable."
        )
    )]
    NoCredentials {
        profile: String,
        credential: String,
        env: String,
    },

    // ── Entitlements ─────────────────────────────────────────────────
    #[error("{user_id} has reached the free-tier {resource} limit")]
    #[diagnostic(
        code(medscribe::limit_reached),
        help("A premium subscription lifts the limit. Run: medscribe status {user_id}")
    )]
    LimitReached { user_id: String, resource: String },

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Upstream error: {message}")]
    #[diagnostic(code(medscribe::upstream))]
    Upstream { message: String },

    #[error("Rate limited by upstream")]
    #[diagnostic(
        code(medscribe::rate_limited),
        help("Retry after {retry_after_secs}s.")
    )]
    RateLimited { retry_after_secs: u64 },

    #[error("Store returned a malformed record: {message}")]
    #[diagnostic(code(medscribe::invalid_record))]
    InvalidRecord { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(medscribe::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(medscribe::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: medscribe config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(
        code(medscribe::not_configured),
        help(
            "Create a profile with: medscribe config init\n\
             Expected at: {path}"
        )
    )]
    NotConfigured { message: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(medscribe::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(medscribe::timeout),
        help("Increase the timeout with --timeout or check upstream responsiveness.")
    )]
    Timeout,

    // ── Internal / IO / Serialization ───────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(medscribe::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(medscribe::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(medscribe::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Upstream { .. } | Self::RateLimited { .. } | Self::InvalidRecord { .. } => {
                exit_code::UPSTREAM
            }
            Self::Config(inner) => match inner.as_ref() {
                ConfigError::NoCredentials { .. } => exit_code::AUTH,
                ConfigError::ProfileNotFound { .. } => exit_code::NOT_FOUND,
                ConfigError::Validation { .. } => exit_code::USAGE,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput { field, reason } => CliError::Validation { field, reason },

            CoreError::InvalidRecord { message } => CliError::InvalidRecord { message },

            CoreError::UpstreamUnavailable { service, reason } => {
                CliError::ConnectionFailed { service, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::RateLimited { retry_after_secs } => {
                CliError::RateLimited { retry_after_secs }
            }

            CoreError::Api { message, .. } => CliError::Upstream { message },

            CoreError::Config { message } => CliError::NotConfigured {
                message,
                path: medscribe_config::config_path().display().to_string(),
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials {
                profile,
                credential,
            } => CliError::NoCredentials {
                profile,
                credential: credential.to_string(),
                env: credential.fallback_env().into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (CoreError::invalid_input("userId", "must not be empty"), exit_code::USAGE),
            (
                CoreError::AuthenticationFailed {
                    message: "bad key".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::UpstreamUnavailable {
                    service: "store".into(),
                    reason: "connection refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout { timeout_secs: 30 }, exit_code::TIMEOUT),
            (
                CoreError::Api {
                    message: "quota".into(),
                    code: None,
                    status: Some(429),
                },
                exit_code::UPSTREAM,
            ),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), code, "{label}");
        }
    }

    #[test]
    fn missing_credentials_are_auth_failures() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "clinic".into(),
            credential: medscribe_config::Credential::Store,
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(matches!(
            err,
            CliError::NoCredentials { ref env, .. } if env == "MEDSCRIBE_STORE_KEY"
        ));
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let err = CliError::from(ConfigError::ProfileNotFound {
            profile: "ghost".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
