use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::indexer::ReviewIndexer;
use super::store::{RetrievedReview, VectorStore};
use crate::core::errors::ChatError;
use crate::llm::Embedder;

/// Finds the reviews most relevant to a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// At most `k` reviews, most similar first. Failures are reported as
    /// [`ChatError::RetrievalUnavailable`], never as an empty result.
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedReview>, ChatError>;
}

pub struct VectorRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    indexer: ReviewIndexer,
    top_k: usize,
    populated: OnceCell<usize>,
}

impl VectorRetriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        indexer: ReviewIndexer,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            indexer,
            top_k: top_k.max(1),
            populated: OnceCell::new(),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Populates the index on first use. Later calls are free; a failed
    /// attempt is retried on the next call.
    pub async fn ensure_populated(&self) -> Result<usize, ChatError> {
        self.populated
            .get_or_try_init(|| self.indexer.ensure_populated())
            .await
            .copied()
            .map_err(|e| {
                tracing::error!("Failed to populate review index: {}", e);
                ChatError::RetrievalUnavailable(e.to_string())
            })
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedReview>, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::InputEmpty);
        }

        self.ensure_populated().await?;

        let mut embeddings = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| {
                tracing::warn!("Failed to embed query: {}", e);
                ChatError::RetrievalUnavailable(e.to_string())
            })?;
        let query_embedding = embeddings
            .pop()
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| {
                ChatError::RetrievalUnavailable(
                    "embedder returned no vector for the query".to_string(),
                )
            })?;

        let results = self
            .store
            .search(&query_embedding, self.top_k)
            .await
            .map_err(|e| {
                tracing::warn!("Review search failed: {}", e);
                ChatError::RetrievalUnavailable(e.to_string())
            })?;

        tracing::debug!(
            "Retrieved {} reviews (top score {:?})",
            results.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }
}
