use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rag::RetrievedReview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a transcript. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviews: Option<Vec<RetrievedReview>>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            reviews: None,
        }
    }

    pub fn assistant(text: impl Into<String>, reviews: Vec<RetrievedReview>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
            reviews: Some(reviews),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reviews that grounded an assistant answer; `None` for user turns.
    pub fn reviews(&self) -> Option<&[RetrievedReview]> {
        self.reviews.as_deref()
    }
}

/// Ordered conversation history: append-only, except for a full clear.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn assistant_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| turn.role == Role::Assistant)
            .count()
    }
}
