use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::{Embedder, LlmProvider, TextGenerator};
use super::types::{truncate_for_error, ProviderConfig};
use crate::core::errors::ApiError;

/// Client for an Ollama server's native API.
#[derive(Clone)]
pub struct OllamaProvider {
    config: ProviderConfig,
    client: Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn request_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Internal(format!(
                "Ollama request timed out after {}s",
                self.config.timeout_secs
            ))
        } else {
            ApiError::Internal(format!("Ollama request failed: {}", err))
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let mut body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
        });
        if let Some(temperature) = self.config.temperature {
            body["options"] = json!({ "temperature": temperature });
        }

        let res = self
            .client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Ollama generate error ({}): {}",
                status,
                truncate_for_error(&text)
            )));
        }

        let payload: GenerateResponse = res.json().await.map_err(|e| self.request_error(e))?;
        Ok(payload.response)
    }
}

#[async_trait]
impl Embedder for OllamaProvider {
    fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.config.embedding_model,
            "input": inputs,
        });

        let res = self
            .client
            .post(self.url("/api/embed"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Ollama embed error ({}): {}",
                status,
                truncate_for_error(&text)
            )));
        }

        let payload: EmbedResponse = res.json().await.map_err(|e| self.request_error(e))?;
        if payload.embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Ollama returned {} embeddings for {} inputs",
                payload.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(payload.embeddings)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
