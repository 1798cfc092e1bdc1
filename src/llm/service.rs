use std::sync::Arc;

use super::ollama::OllamaProvider;
use super::openai::OpenAiCompatibleProvider;
use super::provider::{Embedder, LlmProvider, TextGenerator};
use super::types::ProviderConfig;
use crate::core::config::settings::LlmSection;
use crate::core::config::ProviderKind;
use crate::core::errors::{ApiError, ChatError};

/// One configured provider, viewed through each of its roles.
#[derive(Clone)]
pub struct ProviderHandles {
    pub provider: Arc<dyn LlmProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub embedder: Arc<dyn Embedder>,
}

impl ProviderHandles {
    fn from_provider<P: LlmProvider + 'static>(provider: P) -> Self {
        let provider = Arc::new(provider);
        Self {
            provider: provider.clone(),
            generator: provider.clone(),
            embedder: provider,
        }
    }
}

pub fn build_provider(section: &LlmSection) -> Result<ProviderHandles, ApiError> {
    let config = ProviderConfig::from_section(section);
    let handles = match section.provider {
        ProviderKind::Ollama => ProviderHandles::from_provider(OllamaProvider::new(config)?),
        ProviderKind::OpenaiCompatible => {
            ProviderHandles::from_provider(OpenAiCompatibleProvider::new(config)?)
        }
    };
    tracing::info!(
        "Using {} provider at {} (model: {}, embeddings: {})",
        handles.provider.name(),
        section.base_url,
        handles.generator.model(),
        handles.embedder.embedding_model()
    );
    Ok(handles)
}

/// The generation step of a question cycle: one prompt in, one non-empty
/// answer out, or [`ChatError::GenerationFailed`].
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let started = std::time::Instant::now();
        let answer = self.generator.generate(prompt).await.map_err(|e| {
            tracing::warn!("Generation with {} failed: {}", self.generator.model(), e);
            ChatError::GenerationFailed(e.to_string())
        })?;

        let answer = answer.trim();
        if answer.is_empty() {
            tracing::warn!("{} returned an empty answer", self.generator.model());
            return Err(ChatError::GenerationFailed(
                "model returned an empty answer".to_string(),
            ));
        }

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated {} characters",
            answer.len()
        );
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedGenerator(Result<&'static str, &'static str>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
            self.0
                .map(str::to_string)
                .map_err(|e| ApiError::Internal(e.to_string()))
        }
    }

    fn client(result: Result<&'static str, &'static str>) -> GenerationClient {
        GenerationClient::new(Arc::new(FixedGenerator(result)))
    }

    #[tokio::test]
    async fn trims_successful_answers() {
        let answer = client(Ok("  The crust is great.\n")).generate("p").await.unwrap();
        assert_eq!(answer, "The crust is great.");
    }

    #[tokio::test]
    async fn provider_errors_become_generation_failed() {
        let err = client(Err("connection refused")).generate("p").await.unwrap_err();
        assert!(matches!(err, ChatError::GenerationFailed(ref msg) if msg.contains("connection refused")));
    }

    #[tokio::test]
    async fn blank_answers_are_failures() {
        let err = client(Ok(" \n ")).generate("p").await.unwrap_err();
        assert!(matches!(err, ChatError::GenerationFailed(_)));
    }

    #[test]
    fn builds_configured_provider() {
        let ollama = build_provider(&LlmSection::default()).unwrap();
        assert_eq!(ollama.provider.name(), "ollama");
        assert_eq!(ollama.generator.model(), "llama3.2");
        assert_eq!(ollama.embedder.embedding_model(), "mxbai-embed-large");

        let openai = build_provider(&LlmSection {
            provider: ProviderKind::OpenaiCompatible,
            base_url: "http://localhost:1234".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(openai.provider.name(), "openai_compatible");
    }
}
