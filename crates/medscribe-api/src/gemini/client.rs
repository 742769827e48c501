// Async client for the Gemini `generateContent` endpoint.
//
// Base path: /v1beta/
// Auth: x-goog-api-key header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::error::Error;
use crate::response;
use crate::transport::{TransportConfig, normalize_base_url};

const SERVICE: &str = "gemini";

/// Public endpoint of the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Async client for the generative-AI API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
}

impl GeminiClient {
    /// Build from an API key; the key travels in `x-goog-api-key`, never
    /// in the URL, so request logging cannot leak it.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        model: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid gemini key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http, model)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        model: impl Into<String>,
    ) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url, "")?;
        Ok(Self {
            http,
            base_url,
            model: model.into(),
        })
    }

    /// The model name requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))?)
    }

    /// Send a raw `generateContent` request.
    ///
    /// `POST /v1beta/models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error> {
        let url = self.generate_url()?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(request).send().await?;
        response::json(SERVICE, resp).await
    }

    /// Send a single prompt and return the first candidate's text.
    pub async fn generate_text(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, Error> {
        let request = GenerateContentRequest::from_prompt(prompt).with_config(config.clone());
        let response = self.generate_content(&request).await?;

        if let Some(candidate) = response.candidates.first() {
            debug!(finish_reason = ?candidate.finish_reason, "gemini candidate received");
        }

        response
            .text()
            .ok_or(Error::EmptyCompletion { service: SERVICE })
    }
}
