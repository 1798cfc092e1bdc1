use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{Embedder, LlmProvider, TextGenerator};
use super::types::{truncate_for_error, ChatMessage, ProviderConfig};
use crate::core::errors::ApiError;

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for servers speaking the OpenAI HTTP API (LM Studio, vLLM,
/// llama.cpp server, hosted endpoints).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    api_base: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ApiError> {
        let base = config.base_url.trim_end_matches('/');
        let api_base = if base.ends_with("/v1") {
            base.to_string()
        } else {
            format!("{}/v1", base)
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            config,
            api_base,
            client,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn request_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Internal(format!(
                "OpenAI-compatible request timed out after {}s",
                self.config.timeout_secs
            ))
        } else {
            ApiError::Internal(format!("OpenAI-compatible request failed: {}", err))
        }
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_base, endpoint);
        let res = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "OpenAI-compatible {} error ({}): {}",
                endpoint,
                status,
                truncate_for_error(&text)
            )));
        }

        res.json().await.map_err(|e| self.request_error(e))
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": [ChatMessage::user(prompt)],
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = self.config.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
        }

        let payload = self.post_json("/chat/completions", &body).await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::Internal("OpenAI-compatible response has no message content".to_string())
            })
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleProvider {
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
        let payload = self.post_json("/embeddings", &body).await?;

        let response: EmbeddingsResponse = serde_json::from_value(payload).map_err(|e| {
            ApiError::Internal(format!("Invalid OpenAI-compatible embeddings response: {}", e))
        })?;

        if response.data.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "OpenAI-compatible server returned {} embeddings for {} inputs",
                response.data.len(),
                inputs.len()
            )));
        }

        // Items may arrive in any order; `index` ties each one to its input.
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; inputs.len()];
        for item in response.data {
            match slots.get_mut(item.index) {
                Some(slot) if slot.is_none() => *slot = Some(item.embedding),
                _ => {
                    return Err(ApiError::Internal(format!(
                        "OpenAI-compatible server returned a duplicate or out-of-range embedding index {}",
                        item.index
                    )));
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/models", self.api_base);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
