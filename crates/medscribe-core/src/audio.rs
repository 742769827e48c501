// ── Base64 audio decoding ──
//
// Browser recordings arrive as base64 text, optionally as a `data:` URL.
// Decoding walks the text in fixed windows so no single decode call has to
// hold a second copy of a large recording.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::CoreError;

/// Default decode window, in base64 characters.
pub const DEFAULT_CHUNK_SIZE: usize = 32_768;

/// MIME type assumed when the payload does not carry one.
pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

const FIELD: &str = "audio";

// Standard alphabet; trailing `=` padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded recording plus the MIME type it was labelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl DecodedAudio {
    /// Upload file name matching the MIME subtype, e.g. `audio.webm`.
    pub fn file_name(&self) -> String {
        let subtype = self
            .mime_type
            .split_once('/')
            .map_or("webm", |(_, sub)| sub.split(';').next().unwrap_or("webm"));
        format!("audio.{subtype}")
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
fn split_data_url(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim_start();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, trimmed);
    };
    match rest.split_once(',') {
        Some((meta, payload)) if meta.ends_with(";base64") => {
            let mime = meta.trim_end_matches(";base64");
            (Some(mime).filter(|m| !m.is_empty()), payload)
        }
        _ => (None, trimmed),
    }
}

/// Decode base64 `input` window by window.
///
/// `chunk_size` is rounded down to a multiple of 4 (minimum 4). An optional
/// `data:*;base64,` prefix and all ASCII whitespace are ignored.
pub fn decode_base64_chunks(input: &str, chunk_size: usize) -> Result<Vec<u8>, CoreError> {
    let (_, payload) = split_data_url(input);
    let cleaned: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(CoreError::invalid_input(FIELD, "audio data is empty"));
    }

    let window = (chunk_size / 4 * 4).max(4);
    let mut out = Vec::with_capacity(cleaned.len() / 4 * 3);
    for (index, chunk) in cleaned.chunks(window).enumerate() {
        LENIENT.decode_vec(chunk, &mut out).map_err(|e| {
            CoreError::invalid_input(
                FIELD,
                format!("invalid base64 in chunk {index}: {e}"),
            )
        })?;
    }

    if out.is_empty() {
        return Err(CoreError::invalid_input(FIELD, "audio data is empty"));
    }
    Ok(out)
}

/// Decode a recording with the default window, keeping any MIME label.
pub fn decode_audio(input: &str) -> Result<DecodedAudio, CoreError> {
    let (mime, _) = split_data_url(input);
    let bytes = decode_base64_chunks(input, DEFAULT_CHUNK_SIZE)?;
    Ok(DecodedAudio {
        bytes,
        mime_type: mime.unwrap_or(DEFAULT_MIME_TYPE).to_owned(),
    })
}
