// medscribe-api: async clients for the managed store, the generative-AI API,
// and the speech-recognition API.

pub mod error;
pub mod gemini;
mod response;
pub mod speech;
pub mod store;
pub mod transport;

pub use error::Error;
pub use gemini::GeminiClient;
pub use speech::SpeechClient;
pub use store::StoreClient;
pub use transport::{TlsMode, TransportConfig};

/// Re-export gemini request/response types for convenient access.
pub use gemini::types as gemini_types;
/// Re-export store row types for convenient access.
pub use store::models as store_models;
