// Speech-recognition client.
//
// Multipart upload to an OpenAI-compatible `/v1/audio/transcriptions`
// endpoint with bearer auth.

pub mod client;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, SpeechClient, Transcription};
