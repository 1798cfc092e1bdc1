use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Typed view of `config.yml` merged with `secrets.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub server: ServerSection,
    pub reviews: ReviewsSection,
    pub retrieval: RetrievalSection,
    pub llm: LlmSection,
    pub prompt: PromptSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub max_input_length: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Chat sessions unused for this long are discarded.
    pub session_idle_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: Vec::new(),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl ServerSection {
    /// Configured origins, or the local development defaults when none are set.
    pub fn allowed_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            default_local_origins()
        } else {
            origins
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsSection {
    pub csv_path: PathBuf,
    /// How the restaurant is described to the model, e.g. "a pizza restaurant".
    pub restaurant: String,
}

impl Default for ReviewsSection {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            restaurant: DEFAULT_RESTAURANT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
    pub embed_batch_size: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSection {
    pub template: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: AppConfig = serde_json::from_value(json!({
            "retrieval": { "top_k": 3 },
            "llm": { "provider": "openai_compatible" }
        }))
        .unwrap();

        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.embed_batch_size, DEFAULT_EMBED_BATCH_SIZE);
        assert_eq!(config.llm.provider, ProviderKind::OpenaiCompatible);
        assert_eq!(config.llm.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.app.max_input_length, DEFAULT_MAX_INPUT_LENGTH);
        assert!(config.prompt.template.is_none());
    }

    #[test]
    fn allowed_origins_ignore_blank_entries() {
        let server = ServerSection {
            cors_allowed_origins: vec!["  ".into(), " https://reviews.example ".into()],
            ..Default::default()
        };
        assert_eq!(server.allowed_origins(), vec!["https://reviews.example"]);

        let empty = ServerSection::default();
        assert_eq!(empty.allowed_origins(), default_local_origins());
    }
}
