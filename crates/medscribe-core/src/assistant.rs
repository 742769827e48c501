// ── AI assistant facade ──
//
// Thin request/response adapters over the generative-AI and speech APIs.
// Inputs are validated and templated here; the clients only move bytes.

use tracing::{debug, info};

use medscribe_api::gemini_types::GenerationConfig;
use medscribe_api::{GeminiClient, SpeechClient};

use crate::audio::{self, DecodedAudio};
use crate::config::GenerationSettings;
use crate::error::CoreError;
use crate::prompts;

/// Facade over whichever model endpoints are configured.
#[derive(Debug, Clone)]
pub struct Assistant {
    gemini: Option<GeminiClient>,
    speech: Option<SpeechClient>,
    generation: GenerationConfig,
}

impl Assistant {
    pub fn new(
        gemini: Option<GeminiClient>,
        speech: Option<SpeechClient>,
        generation: GenerationSettings,
    ) -> Self {
        Self {
            gemini,
            speech,
            generation: generation.into(),
        }
    }

    fn gemini(&self) -> Result<&GeminiClient, CoreError> {
        self.gemini.as_ref().ok_or_else(|| CoreError::Config {
            message: "no Gemini API key configured".into(),
        })
    }

    fn speech(&self) -> Result<&SpeechClient, CoreError> {
        self.speech.as_ref().ok_or_else(|| CoreError::Config {
            message: "no speech API key configured".into(),
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        let client = self.gemini()?;
        debug!(model = client.model(), chars = prompt.len(), "sending generation request");
        Ok(client.generate_text(prompt, &self.generation).await?)
    }

    /// Generate medical content for a free-form request.
    pub async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        let prompt = prompts::generate(prompt)?;
        self.complete(&prompt).await
    }

    /// Continue or rewrite content in the requested tone.
    pub async fn write(
        &self,
        prompt: &str,
        existing_content: Option<&str>,
        tone: Option<&str>,
    ) -> Result<String, CoreError> {
        let prompt = prompts::write(prompt, existing_content, tone)?;
        self.complete(&prompt).await
    }

    /// Restructure a clinical note.
    pub async fn enhance_note(
        &self,
        note: &str,
        note_type: Option<&str>,
    ) -> Result<String, CoreError> {
        let prompt = prompts::enhance_note(note, note_type)?;
        self.complete(&prompt).await
    }

    /// Transcribe a base64 recording (optionally a `data:` URL).
    pub async fn transcribe_base64(&self, audio: &str) -> Result<String, CoreError> {
        let decoded = audio::decode_audio(audio)?;
        self.transcribe(decoded).await
    }

    /// Transcribe raw audio bytes.
    pub async fn transcribe_bytes(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::invalid_input("audio", "audio data is empty"));
        }
        self.transcribe(DecodedAudio {
            bytes,
            mime_type: mime_type.to_owned(),
        })
        .await
    }

    async fn transcribe(&self, audio: DecodedAudio) -> Result<String, CoreError> {
        let client = self.speech()?;
        let file_name = audio.file_name();
        info!(
            model = client.model(),
            bytes = audio.bytes.len(),
            mime = %audio.mime_type,
            "transcribing audio"
        );
        let transcription = client
            .transcribe(audio.bytes, &file_name, &audio.mime_type)
            .await?;
        Ok(transcription.text)
    }
}
