use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::prompt::{QUESTION_PLACEHOLDER, REVIEWS_PLACEHOLDER};

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(app) = expect_optional_object(root, "app")? {
        validate_u64_field(
            app,
            "app.max_input_length",
            "max_input_length",
            1,
            10_000_000,
        )?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.session_idle_secs",
            "session_idle_secs",
            60,
            7 * 24 * 3600,
        )?;
    }

    if let Some(reviews) = expect_optional_object(root, "reviews")? {
        validate_optional_string_field(reviews, "reviews.csv_path", "csv_path")?;
        validate_optional_string_field(reviews, "reviews.restaurant", "restaurant")?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
        validate_u64_field(
            retrieval,
            "retrieval.embed_batch_size",
            "embed_batch_size",
            1,
            1024,
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_enum_field(llm, "llm.provider", "provider", &["ollama", "openai_compatible"])?;
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 3600)?;
    }

    if let Some(prompt) = expect_optional_object(root, "prompt")? {
        validate_optional_string_field(prompt, "prompt.template", "template")?;
        if let Some(template) = prompt.get("template").and_then(|v| v.as_str()) {
            for placeholder in [REVIEWS_PLACEHOLDER, QUESTION_PLACEHOLDER] {
                if !template.contains(placeholder) {
                    return Err(ApiError::BadRequest(format!(
                        "Invalid config at 'prompt.template': missing {} placeholder",
                        placeholder
                    )));
                }
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
