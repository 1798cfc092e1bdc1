//! Storage interface for the review index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::reviews::ReviewDocument;

/// A review returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedReview {
    pub review: ReviewDocument,
    /// Cosine similarity to the query (higher = better).
    pub score: f32,
}

/// Storage backend for review embeddings.
///
/// Implementations should support:
/// - Nearest-k search ordered by descending similarity
/// - Atomic bulk insertion for first-run population
/// - Index reset on embedding model change
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert reviews with their embedding vectors in one transaction.
    /// Re-inserting a review with the same id replaces it.
    async fn insert_batch(&self, items: Vec<(ReviewDocument, Vec<f32>)>) -> Result<(), ApiError>;

    /// Return at most `limit` reviews, most similar first. Equal scores keep
    /// insertion order.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedReview>, ApiError>;

    /// Number of indexed reviews.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Embedding model the stored vectors were produced with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, ApiError>;

    /// Clear all vectors and record the model that the next population uses.
    async fn reindex_with_model(&self, embedding_model: &str) -> Result<(), ApiError>;
}
