//! Shared configuration for the medscribe binary and server.
//!
//! TOML profiles, credential resolution (env var, keyring, plaintext), and
//! translation to `medscribe_core::ServiceConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use url::Url;

use medscribe_core::{
    FreeTierLimits, GenerationSettings, ModelEndpoint, RetryPolicy, ServiceConfig, StoreConfig,
    TlsVerification,
};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "medscribe";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "MEDSCRIBE_CONFIG";

/// Default address for `medscribe serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {credential} key configured for profile '{profile}'")]
    NoCredentials {
        profile: String,
        credential: Credential,
    },

    #[error("profile '{profile}' not found")]
    ProfileNotFound { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            bind: default_bind(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_bind() -> String {
    DEFAULT_BIND.into()
}

/// A named profile: one deployment's upstreams and tuning.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Store project URL (e.g., "https://abc.supabase.co").
    pub store_url: Option<String>,
    /// Store API key (plaintext; prefer keyring or env var).
    pub store_key: Option<String>,
    /// Environment variable name containing the store key.
    pub store_key_env: Option<String>,

    /// Generative-AI API base URL.
    pub gemini_url: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_key: Option<String>,
    pub gemini_key_env: Option<String>,

    /// Speech-recognition API base URL.
    pub speech_url: Option<String>,
    pub speech_model: Option<String>,
    pub speech_key: Option<String>,
    pub speech_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Free-tier overrides.
    pub free_patient_limit: Option<u32>,
    pub free_consultation_limit: Option<u32>,

    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,

    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,

    /// Server bind address override.
    pub bind: Option<String>,
}

// ── Credentials ─────────────────────────────────────────────────────

/// The upstream a secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Credential {
    Store,
    Gemini,
    Speech,
}

impl Credential {
    /// Keyring user for this credential: `{profile}/{credential}-key`.
    pub fn keyring_user(self, profile_name: &str) -> String {
        format!("{profile_name}/{self}-key")
    }

    /// Conventional environment variable consulted when the profile names
    /// none.
    pub fn fallback_env(self) -> &'static str {
        match self {
            Self::Store => "MEDSCRIBE_STORE_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Speech => "OPENAI_API_KEY",
        }
    }

    fn fields(self, profile: &Profile) -> (Option<&str>, Option<&str>) {
        match self {
            Self::Store => (profile.store_key_env.as_deref(), profile.store_key.as_deref()),
            Self::Gemini => (
                profile.gemini_key_env.as_deref(),
                profile.gemini_key.as_deref(),
            ),
            Self::Speech => (
                profile.speech_key_env.as_deref(),
                profile.speech_key.as_deref(),
            ),
        }
    }
}

fn keyring_entry(credential: Credential, profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &credential.keyring_user(profile_name),
    )?)
}

/// Resolve a secret with an explicit environment lookup.
///
/// Order: the profile's `*_key_env` variable, the conventional variable,
/// the system keyring, then the plaintext value in the profile.
pub fn resolve_secret_with<F>(
    profile: &Profile,
    profile_name: &str,
    credential: Credential,
    env: F,
) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    let (env_name, plaintext) = credential.fields(profile);

    // 1. Env vars
    if let Some(val) = env_name.and_then(&env) {
        return Some(SecretString::from(val));
    }
    if let Some(val) = env(credential.fallback_env()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(credential, profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|key| SecretString::from(key.to_owned()))
}

/// Resolve a secret from the process environment, keyring, or profile.
pub fn resolve_secret(
    profile: &Profile,
    profile_name: &str,
    credential: Credential,
) -> Option<SecretString> {
    resolve_secret_with(profile, profile_name, credential, |name| {
        std::env::var(name).ok()
    })
}

/// Store a secret in the system keyring.
pub fn store_secret(
    profile_name: &str,
    credential: Credential,
    secret: &SecretString,
) -> Result<(), ConfigError> {
    keyring_entry(credential, profile_name)?.set_password(secret.expose_secret())?;
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$MEDSCRIBE_CONFIG`, then platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "medscribe", "medscribe").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("medscribe");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from `path` layered over defaults and `MEDSCRIBE_*` env vars.
///
/// Nested env keys use a double underscore: `MEDSCRIBE_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEDSCRIBE_").split("__").ignore(&["config"]));

    Ok(figment.extract()?)
}

/// Load the full Config from the canonical path + environment.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation to ServiceConfig ────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn model_endpoint(
    credential: Credential,
    url: Option<&str>,
    model: Option<&str>,
    default_url: &str,
    default_model: &str,
    key: Option<SecretString>,
) -> Result<Option<ModelEndpoint>, ConfigError> {
    let Some(api_key) = key else {
        return Ok(None);
    };
    let field = format!("{credential}_url");
    Ok(Some(ModelEndpoint {
        base_url: parse_url(&field, url.unwrap_or(default_url))?,
        api_key,
        model: model.unwrap_or(default_model).to_owned(),
    }))
}

/// Free-tier caps with the profile's overrides applied. Needs no secrets.
pub fn free_tier_limits(profile: &Profile) -> FreeTierLimits {
    let defaults = FreeTierLimits::default();
    FreeTierLimits {
        patients: profile.free_patient_limit.unwrap_or(defaults.patients),
        consultations: profile
            .free_consultation_limit
            .unwrap_or(defaults.consultations),
    }
}

/// Build a `ServiceConfig` from a profile using the given secret lookup.
///
/// Upstreams without a key are left unconfigured, except the store: a
/// profile that names a store URL must also provide its key.
pub fn profile_to_service_config_with<F>(
    profile: &Profile,
    profile_name: &str,
    resolve: F,
) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(Credential) -> Option<SecretString>,
{
    let store = match profile.store_url.as_deref() {
        Some(raw) => {
            let url = parse_url("store_url", raw)?;
            let api_key = resolve(Credential::Store).ok_or_else(|| ConfigError::NoCredentials {
                profile: profile_name.into(),
                credential: Credential::Store,
            })?;
            Some(StoreConfig { url, api_key })
        }
        None => None,
    };

    let gemini = model_endpoint(
        Credential::Gemini,
        profile.gemini_url.as_deref(),
        profile.gemini_model.as_deref(),
        medscribe_api::gemini::DEFAULT_BASE_URL,
        medscribe_api::gemini::DEFAULT_MODEL,
        resolve(Credential::Gemini),
    )?;
    let speech = model_endpoint(
        Credential::Speech,
        profile.speech_url.as_deref(),
        profile.speech_model.as_deref(),
        medscribe_api::speech::DEFAULT_BASE_URL,
        medscribe_api::speech::DEFAULT_MODEL,
        resolve(Credential::Speech),
    )?;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);

    let default_retry = RetryPolicy::default();
    let retry = RetryPolicy {
        max_attempts: profile.retry_attempts.unwrap_or(default_retry.max_attempts),
        backoff: profile
            .retry_backoff_ms
            .map_or(default_retry.backoff, Duration::from_millis),
    };

    let default_generation = GenerationSettings::default();
    let generation = GenerationSettings {
        temperature: profile.temperature.unwrap_or(default_generation.temperature),
        max_output_tokens: profile
            .max_output_tokens
            .unwrap_or(default_generation.max_output_tokens),
    };

    Ok(ServiceConfig {
        store,
        gemini,
        speech,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(30)),
        limits: free_tier_limits(profile),
        retry,
        generation,
    })
}

/// Build a `ServiceConfig` from a profile, resolving secrets from the
/// environment, keyring, and plaintext fields.
pub fn profile_to_service_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ServiceConfig, ConfigError> {
    profile_to_service_config_with(profile, profile_name, |credential| {
        resolve_secret(profile, profile_name, credential)
    })
}
