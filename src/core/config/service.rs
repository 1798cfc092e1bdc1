use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "bearer",
    "access_key",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "tokenizer", "tokens"];

/// Environment variables that override individual config entries.
const ENV_OVERRIDES: [(&str, &[&str]); 3] = [
    ("OLLAMA_BASE_URL", &["llm", "base_url"]),
    ("OLLAMA_MODEL", &["llm", "model"]),
    ("PORT", &["server", "port"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("REVIEWBOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Raw merged config (public file + secrets file + env overrides).
    pub fn load_config(&self) -> Value {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, |key| env::var(key).ok());
        merged
    }

    /// Validated, typed config.
    pub fn load_settings(&self) -> Result<AppConfig, ApiError> {
        let raw = self.load_config();
        validate_config(&raw)?;
        tracing::debug!(config = %redact_sensitive_values(&raw), "Loaded configuration");
        serde_json::from_value(raw).map_err(|e| {
            ApiError::BadRequest(format!("Invalid config: {}", e))
        })
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(e) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), e);
                Value::Object(Map::new())
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), e);
            Value::Object(Map::new())
        }
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        // Numeric overrides (PORT) must stay numbers for validation.
        let value = raw
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        ensure_object_path(config, path, value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
