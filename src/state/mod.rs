use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::chat::{ChatPipeline, SessionRegistry};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::llm::{build_provider, GenerationClient, LlmProvider};
use crate::prompt::PromptComposer;
use crate::rag::{ReviewIndexer, ReviewSource, SqliteVectorStore, VectorRetriever, VectorStore};

pub mod error;

use error::InitializationError;

/// Application state shared by the HTTP handlers and the terminal client.
///
/// Contains references to:
/// - Paths and the loaded configuration
/// - The review index and the retriever that populates it
/// - The LLM provider (for health checks) and the chat pipeline
/// - In-memory chat sessions
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: AppConfig,
    pub provider: Arc<dyn LlmProvider>,
    pub store: Arc<dyn VectorStore>,
    pub retriever: Arc<VectorRetriever>,
    pub pipeline: ChatPipeline,
    pub sessions: SessionRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads configuration from the usual locations and builds the state.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let settings = ConfigService::new(paths.clone())
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;
        Self::with_settings(paths, settings).await
    }

    /// Builds the state from already-loaded settings:
    /// 1. Opens the SQLite review index
    /// 2. Creates the configured LLM provider
    /// 3. Wires the retriever, prompt composer and generation client
    pub async fn with_settings(
        paths: Arc<AppPaths>,
        settings: AppConfig,
    ) -> Result<Arc<Self>, InitializationError> {
        let store: Arc<dyn VectorStore> = Arc::new(
            SqliteVectorStore::new(&paths)
                .await
                .map_err(|e| InitializationError::Index(e.into()))?,
        );

        let handles =
            build_provider(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;

        let source = ReviewSource::Csv(paths.resolve(&settings.reviews.csv_path));
        let indexer = ReviewIndexer::new(
            store.clone(),
            handles.embedder.clone(),
            source,
            settings.retrieval.embed_batch_size,
        );
        let retriever = Arc::new(VectorRetriever::new(
            store.clone(),
            handles.embedder.clone(),
            indexer,
            settings.retrieval.top_k,
        ));

        let composer = PromptComposer::new(
            settings.prompt.template.clone(),
            settings.reviews.restaurant.clone(),
        );
        let pipeline = ChatPipeline::new(
            retriever.clone(),
            composer,
            GenerationClient::new(handles.generator.clone()),
            settings.app.max_input_length,
        );
        let sessions = SessionRegistry::new(pipeline.clone());

        Ok(Arc::new(AppState {
            paths,
            settings,
            provider: handles.provider,
            store,
            retriever,
            pipeline,
            sessions,
            started_at: Utc::now(),
        }))
    }

    /// Periodically discards chat sessions idle longer than
    /// `server.session_idle_secs`.
    pub fn spawn_session_sweeper(self: &Arc<Self>) {
        let max_idle = Duration::from_secs(self.settings.server.session_idle_secs);
        let period = (max_idle / 4).max(Duration::from_secs(15));
        let state = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                state.sessions.remove_idle(max_idle).await;
            }
        });
    }

    /// Populates the review index in the background so the first question
    /// doesn't pay for it. Failures are logged; retrieval retries later.
    pub fn spawn_index_warmup(self: &Arc<Self>) {
        let retriever = self.retriever.clone();
        tokio::spawn(async move {
            match retriever.ensure_populated().await {
                Ok(count) => tracing::info!("Review index ready ({} reviews)", count),
                Err(e) => tracing::warn!("Review index not ready yet: {}", e),
            }
        });
    }
}
