// ── Runtime service configuration ──
//
// Describes *where* the upstreams live and how to reach them. Carries
// credentials and tuning, never touches disk. The binary builds a
// `ServiceConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use medscribe_api::gemini_types::GenerationConfig;
use medscribe_api::{GeminiClient, SpeechClient, StoreClient, TlsMode, TransportConfig};

use crate::assistant::Assistant;
use crate::backend::StoreBackend;
use crate::error::CoreError;
use crate::evaluator::Evaluator;
use crate::limits::FreeTierLimits;
use crate::retry::RetryPolicy;
use crate::service::EntitlementService;

/// Managed store endpoint.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project URL (with or without the `/rest/v1` suffix).
    pub url: Url,
    pub api_key: SecretString,
}

/// A model-serving API endpoint.
#[derive(Debug, Clone)]
pub struct ModelEndpoint {
    pub base_url: Url,
    pub api_key: SecretString,
    pub model: String,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Additionally trust a custom CA certificate file.
    CustomCa(PathBuf),
}

/// Sampling settings sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

impl From<GenerationSettings> for GenerationConfig {
    fn from(settings: GenerationSettings) -> Self {
        GenerationConfig {
            temperature: Some(settings.temperature),
            max_output_tokens: Some(settings.max_output_tokens),
            ..GenerationConfig::default()
        }
    }
}

/// Everything needed to talk to the upstreams.
///
/// Each upstream is optional so that commands needing only one of them can
/// run with a partial profile.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub store: Option<StoreConfig>,
    pub gemini: Option<ModelEndpoint>,
    pub speech: Option<ModelEndpoint>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub limits: FreeTierLimits,
    pub retry: RetryPolicy,
    pub generation: GenerationSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store: None,
            gemini: None,
            speech: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            limits: FreeTierLimits::default(),
            retry: RetryPolicy::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl ServiceConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            },
            timeout: self.timeout,
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.limits)
    }

    pub fn store_client(&self) -> Result<StoreClient, CoreError> {
        let store = self.store.as_ref().ok_or_else(|| CoreError::Config {
            message: "no store URL configured".into(),
        })?;
        Ok(StoreClient::from_api_key(
            store.url.as_str(),
            &store.api_key,
            &self.transport(),
        )?)
    }

    /// Store-backed entitlement service using the configured limits and
    /// retry policy.
    pub fn entitlement_service(
        &self,
    ) -> Result<EntitlementService<StoreBackend, StoreBackend>, CoreError> {
        let backend = StoreBackend::new(self.store_client()?);
        Ok(EntitlementService::new(backend.clone(), backend)
            .with_evaluator(self.evaluator())
            .with_retry(self.retry))
    }

    /// Assistant over whichever model endpoints are configured.
    pub fn assistant(&self) -> Result<Assistant, CoreError> {
        let transport = self.transport();
        let gemini = self
            .gemini
            .as_ref()
            .map(|ep| {
                GeminiClient::from_api_key(
                    ep.base_url.as_str(),
                    &ep.api_key,
                    ep.model.clone(),
                    &transport,
                )
            })
            .transpose()?;
        let speech = self
            .speech
            .as_ref()
            .map(|ep| {
                SpeechClient::from_api_key(
                    ep.base_url.as_str(),
                    &ep.api_key,
                    ep.model.clone(),
                    &transport,
                )
            })
            .transpose()?;
        Ok(Assistant::new(gemini, speech, self.generation))
    }
}
