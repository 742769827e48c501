use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response;
use crate::transport::{TransportConfig, normalize_base_url};

const SERVICE: &str = "speech";

/// Public endpoint of the speech API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "whisper-1";

/// Transcription result from `POST /v1/audio/transcriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// Async client for the speech-recognition API.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
}

impl SpeechClient {
    /// Build from an API key, sent as `Authorization: Bearer`.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        model: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid speech key header value: {e}"),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http, model)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        model: impl Into<String>,
    ) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url, "v1")?;
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

    /// Upload raw audio bytes for transcription.
    ///
    /// `POST /v1/audio/transcriptions` (multipart: `file`, `model`)
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<Transcription, Error> {
        let url = self.base_url.join("audio/transcriptions")?;
        debug!(bytes = audio.len(), "POST {url}");

        let file = Part::bytes(audio)
            .file_name(file_name.to_owned())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let resp = self.http.post(url).multipart(form).send().await?;
        response::json(SERVICE, resp).await
    }
}
