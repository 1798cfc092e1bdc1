//! First-run population of the review index.

use std::path::PathBuf;
use std::sync::Arc;

use super::store::VectorStore;
use crate::core::errors::ApiError;
use crate::llm::Embedder;
use crate::reviews::{load_reviews, ReviewDocument};

/// Where the reviews to index come from.
#[derive(Debug, Clone)]
pub enum ReviewSource {
    Csv(PathBuf),
    /// Already-loaded records (seeding and tests).
    Documents(Vec<ReviewDocument>),
}

impl ReviewSource {
    fn load(&self) -> Result<Vec<ReviewDocument>, ApiError> {
        match self {
            ReviewSource::Csv(path) => {
                load_reviews(path).map_err(|e| ApiError::Internal(format!("{:#}", e)))
            }
            ReviewSource::Documents(documents) => Ok(documents.clone()),
        }
    }
}

pub struct ReviewIndexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    source: ReviewSource,
    batch_size: usize,
}

impl ReviewIndexer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        source: ReviewSource,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            source,
            batch_size: batch_size.max(1),
        }
    }

    /// Makes sure the index holds vectors from the current embedding model,
    /// embedding the review source when it does not. Returns the number of
    /// indexed reviews.
    ///
    /// Population is all-or-nothing: every review is embedded before a
    /// single transaction writes them, so a failed run leaves the index
    /// empty and the next call retries.
    pub async fn ensure_populated(&self) -> Result<usize, ApiError> {
        let model = self.embedder.embedding_model();
        let stored_model = self.store.embedding_model().await?;

        if stored_model.as_deref() != Some(model) {
            if let Some(previous) = &stored_model {
                tracing::warn!(
                    "Embedding model changed from {} to {}; rebuilding review index",
                    previous,
                    model
                );
            }
            self.store.reindex_with_model(model).await?;
        }

        let existing = self.store.count().await?;
        if existing > 0 {
            tracing::debug!("Review index already holds {} reviews", existing);
            return Ok(existing);
        }

        let reviews = self.source.load()?;
        if reviews.is_empty() {
            return Err(ApiError::Internal(
                "review source contains no reviews to index".to_string(),
            ));
        }

        tracing::info!("Embedding {} reviews with {}", reviews.len(), model);
        let mut items = Vec::with_capacity(reviews.len());
        for batch in reviews.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(ReviewDocument::content).collect();
            let embeddings = self.embedder.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(ApiError::Internal(format!(
                    "embedder returned {} vectors for {} reviews",
                    embeddings.len(),
                    batch.len()
                )));
            }
            items.extend(batch.iter().cloned().zip(embeddings));
            tracing::debug!("Embedded {}/{} reviews", items.len(), reviews.len());
        }

        self.store.insert_batch(items).await?;
        let count = self.store.count().await?;
        tracing::info!("Review index populated with {} reviews", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::rag::SqliteVectorStore;

    struct CountingEmbedder {
        model: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingEmbedder {
        fn new(model: &'static str) -> Self {
            Self {
                model,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn embedding_model(&self) -> &str {
            self.model
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Internal("embedding server down".to_string()));
            }
            Ok(inputs.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    fn documents(n: usize) -> ReviewSource {
        ReviewSource::Documents(
            (0..n)
                .map(|i| ReviewDocument::new(format!("Review {}", i), "Tasty", Some(4), None))
                .collect(),
        )
    }

    async fn store(dir: &tempfile::TempDir) -> Arc<dyn VectorStore> {
        Arc::new(
            SqliteVectorStore::with_path(dir.path().join("index.db"))
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn populates_in_batches_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let embedder = Arc::new(CountingEmbedder::new("embed-a"));
        let indexer = ReviewIndexer::new(store.clone(), embedder.clone(), documents(5), 2);

        assert_eq!(indexer.ensure_populated().await.unwrap(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);

        assert_eq!(indexer.ensure_populated().await.unwrap(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn model_change_rebuilds_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let first = ReviewIndexer::new(
            store.clone(),
            Arc::new(CountingEmbedder::new("embed-a")),
            documents(3),
            8,
        );
        first.ensure_populated().await.unwrap();

        let embedder_b = Arc::new(CountingEmbedder::new("embed-b"));
        let second = ReviewIndexer::new(store.clone(), embedder_b.clone(), documents(2), 8);
        assert_eq!(second.ensure_populated().await.unwrap(), 2);
        assert_eq!(embedder_b.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.embedding_model().await.unwrap().as_deref(),
            Some("embed-b")
        );
    }

    #[tokio::test]
    async fn failed_population_leaves_index_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let embedder = Arc::new(CountingEmbedder {
            fail: true,
            ..CountingEmbedder::new("embed-a")
        });
        let indexer = ReviewIndexer::new(store.clone(), embedder, documents(4), 2);

        assert!(indexer.ensure_populated().await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = ReviewIndexer::new(
            store(&dir).await,
            Arc::new(CountingEmbedder::new("embed-a")),
            documents(0),
            8,
        );

        let err = indexer.ensure_populated().await.unwrap_err();
        assert!(err.to_string().contains("no reviews"));
    }
}
