// Generative-AI client.
//
// Hand-written client for the `generateContent` endpoint of the Gemini API.
// Auth: `x-goog-api-key` header.

pub mod client;
pub mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient};
