//! Default values for the typed configuration.

pub const DEFAULT_MAX_INPUT_LENGTH: usize = 4000;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

pub const DEFAULT_CSV_PATH: &str = "data/realistic_restaurant_reviews.csv";
pub const DEFAULT_RESTAURANT: &str = "a pizza restaurant";

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8501".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8501".to_string(),
    ]
}
