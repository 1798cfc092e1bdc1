use serde::{Deserialize, Serialize};

use crate::core::config::settings::LlmSection;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Connection and model settings shared by every provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn from_section(section: &LlmSection) -> Self {
        Self {
            base_url: section.base_url.trim_end_matches('/').to_string(),
            model: section.model.clone(),
            embedding_model: section.embedding_model.clone(),
            temperature: section.temperature,
            timeout_secs: section.timeout_secs,
            api_key: section.api_key.clone().filter(|key| !key.trim().is_empty()),
        }
    }
}

/// Keeps provider error bodies short enough for logs and error messages.
pub(crate) fn truncate_for_error(text: &str) -> String {
    const MAX_ERROR_BODY: usize = 300;
    if text.chars().count() <= MAX_ERROR_BODY {
        return text.trim().to_string();
    }
    let head: String = text.chars().take(MAX_ERROR_BODY).collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash_and_blank_keys_are_dropped() {
        let section = LlmSection {
            base_url: "http://localhost:11434/".to_string(),
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let config = ProviderConfig::from_section(&section);

        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let truncated = truncate_for_error(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() < 400);
        assert_eq!(truncate_for_error(" short "), "short");
    }
}
