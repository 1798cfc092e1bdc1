use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to open review index: {0}")]
    Index(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),
}
