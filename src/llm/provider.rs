use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Turns text into embedding vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the embedding model; stored alongside the index so a model
    /// change invalidates existing vectors.
    fn embedding_model(&self) -> &str;

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Single-prompt text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}

#[async_trait]
pub trait LlmProvider: Embedder + TextGenerator {
    /// return the provider name (e.g. "ollama", "openai_compatible")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;
}
