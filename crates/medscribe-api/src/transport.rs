// Shared transport configuration for building reqwest::Client instances.
//
// The store, gemini, and speech clients share TLS and timeout settings
// through this module; each client only adds its own auth headers.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

const USER_AGENT: &str = concat!("medscribe/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in webpki root store.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by every upstream client to inject its auth headers once.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Parse a base URL and make sure its path ends with `suffix/`, so that
/// relative joins (`"subscriptions"`, `"v1beta/models/..."`) land under it.
pub(crate) fn normalize_base_url(raw: &str, suffix: &str) -> Result<url::Url, Error> {
    let mut url = url::Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    let suffix = suffix.trim_matches('/');

    if suffix.is_empty() {
        url.set_path(&format!("{path}/"));
    } else if path.ends_with(&format!("/{suffix}")) {
        url.set_path(&format!("{path}/"));
    } else {
        url.set_path(&format!("{path}/{suffix}/"));
    }

    Ok(url)
}
