//! SQLite-backed review index.
//!
//! In-process vector store using SQLite for storage and
//! brute-force cosine similarity for search.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{RetrievedReview, VectorStore};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::reviews::ReviewDocument;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        tracing::debug!("Opened review index at {}", store.db_path.display());
        Ok(store)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS review_vectors (
                review_id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL,
                rating INTEGER,
                review_date TEXT,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        let score = if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        };

        // Overflowing or NaN components never outrank a real match.
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }

    fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> ReviewDocument {
        let rating: Option<i64> = row.get("rating");
        ReviewDocument {
            id: row.get("review_id"),
            title: row.get("title"),
            body: row.get("body"),
            rating: rating.and_then(|r| u8::try_from(r).ok()),
            date: row.get("review_date"),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert_batch(&self, items: Vec<(ReviewDocument, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (review, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO review_vectors
                    (review_id, title, body, rating, review_date, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&review.id)
            .bind(&review.title)
            .bind(&review.body)
            .bind(review.rating.map(i64::from))
            .bind(&review.date)
            .bind(review.content())
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedReview>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if query_embedding.is_empty() {
            return Err(ApiError::Internal("query embedding is empty".to_string()));
        }

        let rows = sqlx::query(
            "SELECT review_id, title, body, rating, review_date, embedding
             FROM review_vectors
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            if embedding_bytes.is_empty() {
                continue;
            }
            let stored_emb = Self::deserialize_embedding(&embedding_bytes);
            if stored_emb.len() != query_embedding.len() {
                return Err(ApiError::Internal(format!(
                    "query embedding has {} dimensions but the index holds {}; rebuild the index",
                    query_embedding.len(),
                    stored_emb.len()
                )));
            }

            scored.push(RetrievedReview {
                review: Self::row_to_review(row),
                score: Self::cosine_similarity(query_embedding, &stored_emb),
            });
        }

        // Stable sort: equal scores stay in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review_vectors")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'embedding_model'")
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    async fn reindex_with_model(&self, embedding_model: &str) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM review_vectors")
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "INSERT OR REPLACE INTO index_meta (key, value, updated_at)
             VALUES ('embedding_model', ?1, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(embedding_model)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(dir: &tempfile::TempDir) -> SqliteVectorStore {
        SqliteVectorStore::with_path(dir.path().join("index.db"))
            .await
            .unwrap()
    }

    fn review(title: &str, body: &str, rating: u8) -> ReviewDocument {
        ReviewDocument::new(title, body, Some(rating), Some("2024-05-01".to_string()))
    }

    #[tokio::test]
    async fn insert_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        let crust = review("Crust", "Delicious crust", 5);
        let burnt = review("Burnt", "Burnt pizza", 1);
        store
            .insert_batch(vec![
                (crust.clone(), vec![1.0, 0.0, 0.0]),
                (burnt.clone(), vec![0.6, 0.8, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].review, crust);
        assert!(results[0].score > 0.99);
        assert_eq!(results[1].review, burnt);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn search_respects_limit_and_orders_by_score() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        let items = (0..6)
            .map(|i| {
                let angle = i as f32 * 0.25;
                (
                    review(&format!("r{}", i), "body", 3),
                    vec![angle.cos(), angle.sin()],
                )
            })
            .collect();
        store.insert_batch(items).await.unwrap();

        let results = store.search(&[0.0, 1.0], 4).await.unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].review.title, "r5");
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .insert_batch(vec![
                (review("first", "same", 4), vec![1.0, 0.0]),
                (review("second", "same", 4), vec![1.0, 0.0]),
                (review("third", "same", 4), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let titles: Vec<String> = store
            .search(&[1.0, 0.0], 3)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.review.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn non_finite_vectors_do_not_break_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        let items = (0..40)
            .map(|i| {
                let embedding = match i % 3 {
                    0 => vec![f32::NAN, 1.0],
                    1 => vec![f32::INFINITY, 0.0],
                    _ => vec![1.0, i as f32 * 0.01],
                };
                (review(&format!("r{}", i), "body", 3), embedding)
            })
            .collect();
        store.insert_batch(items).await.unwrap();

        let results = store.search(&[1.0, 0.0], 40).await.unwrap();
        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| r.score.is_finite()));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].review.title, "r2");
    }

    #[tokio::test]
    async fn mismatched_query_dimensions_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        store
            .insert_batch(vec![
                (review("a", "first", 4), vec![1.0, 0.0, 0.0]),
                (review("b", "second", 2), vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert!(store.search(&[], 5).await.is_err());
        let err = store.search(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(err.to_string().contains("2 dimensions"));
    }

    #[tokio::test]
    async fn identical_reviews_are_stored_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .insert_batch(vec![
                (review("Dup", "Same text", 2), vec![1.0]),
                (review("Dup", "Same text", 2), vec![1.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reindex_with_model_clears_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        assert_eq!(store.embedding_model().await.unwrap(), None);

        store
            .insert_batch(vec![(review("a", "b", 3), vec![1.0])])
            .await
            .unwrap();
        store.reindex_with_model("embed-v2").await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(
            store.embedding_model().await.unwrap().as_deref(),
            Some("embed-v2")
        );
    }

    #[tokio::test]
    async fn index_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = test_store(&dir).await;
            store
                .insert_batch(vec![(review("kept", "still here", 5), vec![0.0, 1.0])])
                .await
                .unwrap();
            store.pool.close().await;
        }

        let reopened = test_store(&dir).await;
        let results = reopened.search(&[0.0, 1.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].review.rating, Some(5));
        assert_eq!(results[0].review.date.as_deref(), Some("2024-05-01"));
    }
}
