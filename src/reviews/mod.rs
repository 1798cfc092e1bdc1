//! Customer review records and the CSV source they are loaded from.

mod loader;

pub use loader::{load_reviews, parse_reviews};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single customer review. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    /// Hex SHA-256 over the record's fields, so identical records share an id.
    pub id: String,
    pub title: String,
    pub body: String,
    pub rating: Option<u8>,
    pub date: Option<String>,
}

impl ReviewDocument {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        rating: Option<u8>,
        date: Option<String>,
    ) -> Self {
        let title = title.into();
        let body = body.into();
        let id = content_id(&title, &body, rating, date.as_deref());
        Self {
            id,
            title,
            body,
            rating,
            date,
        }
    }

    /// Text that gets embedded and shown to the model.
    pub fn content(&self) -> String {
        if self.title.is_empty() {
            self.body.clone()
        } else {
            format!("{} {}", self.title, self.body)
        }
    }

    pub fn rating_label(&self) -> String {
        self.rating
            .map(|rating| rating.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

fn content_id(title: &str, body: &str, rating: Option<u8>, date: Option<&str>) -> String {
    let rating = rating.map(|r| r.to_string()).unwrap_or_default();
    let mut hasher = Sha256::new();
    for field in [title, date.unwrap_or_default(), rating.as_str(), body] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
