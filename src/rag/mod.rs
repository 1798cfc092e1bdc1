//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `VectorStore`: storage interface for review embeddings, backed by `SqliteVectorStore`
//! - `ReviewIndexer`: embeds the review source into an empty index on first run
//! - `VectorRetriever`: embeds a question and returns the top-k nearest reviews

mod indexer;
mod retriever;
mod sqlite;
mod store;

pub use indexer::{ReviewIndexer, ReviewSource};
pub use retriever::{Retriever, VectorRetriever};
pub use sqlite::SqliteVectorStore;
pub use store::{RetrievedReview, VectorStore};
