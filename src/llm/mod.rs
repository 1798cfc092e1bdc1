pub mod ollama;
pub mod openai;
pub mod provider;
pub mod service;
pub mod types;

pub use provider::{Embedder, LlmProvider, TextGenerator};
pub use service::{build_provider, GenerationClient, ProviderHandles};
pub use types::ProviderConfig;
