use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::controller::ConversationController;
use super::pipeline::ChatPipeline;
use crate::core::errors::ApiError;

struct SessionEntry {
    controller: Arc<Mutex<ConversationController>>,
    last_used: Instant,
}

/// In-memory sessions for the HTTP surface. Sessions never share a
/// transcript, are dropped on restart, and expire through
/// [`SessionRegistry::remove_idle`] once unused for long enough.
pub struct SessionRegistry {
    pipeline: ChatPipeline,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self {
            pipeline,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let entry = SessionEntry {
            controller: Arc::new(Mutex::new(self.pipeline.new_controller())),
            last_used: Instant::now(),
        };
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), entry);
        tracing::info!("Created chat session {}", session_id);
        session_id
    }

    /// Locks the session's controller. A session that is mid-cycle is
    /// reported as a conflict rather than waited on.
    pub async fn acquire(
        &self,
        session_id: &str,
    ) -> Result<OwnedMutexGuard<ConversationController>, ApiError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;
            entry.last_used = Instant::now();
            entry.controller.clone()
        };

        handle.try_lock_owned().map_err(|_| {
            ApiError::Conflict(format!(
                "Session {} is still answering the previous question",
                session_id
            ))
        })
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!("Removed chat session {}", session_id);
        }
        removed
    }

    /// Drops sessions not acquired within `max_idle`. Sessions in the middle
    /// of a cycle are kept. Returns how many were removed.
    pub async fn remove_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_used.elapsed() < max_idle || entry.controller.try_lock().is_err()
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!("Expired {} idle chat sessions", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ChatError;
    use crate::llm::GenerationClient;
    use crate::prompt::PromptComposer;
    use crate::rag::{RetrievedReview, Retriever};

    struct EmptyRetriever;

    #[async_trait]
    impl Retriever for EmptyRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedReview>, ChatError> {
            Ok(Vec::new())
        }
    }

    struct Echo;

    #[async_trait]
    impl crate::llm::TextGenerator for Echo {
        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
            Ok(prompt.to_string())
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ChatPipeline::new(
            Arc::new(EmptyRetriever),
            PromptComposer::default(),
            GenerationClient::new(Arc::new(Echo)),
            100,
        ))
    }

    #[tokio::test]
    async fn sessions_have_independent_transcripts() {
        let registry = registry();
        let a = registry.create().await;
        let b = registry.create().await;
        assert_ne!(a, b);

        registry.acquire(&a).await.unwrap().ask("hello").await.unwrap();

        assert_eq!(registry.acquire(&a).await.unwrap().transcript().len(), 2);
        assert!(registry.acquire(&b).await.unwrap().transcript().is_empty());
    }

    #[tokio::test]
    async fn busy_session_is_a_conflict() {
        let registry = registry();
        let id = registry.create().await;

        let _guard = registry.acquire(&id).await.unwrap();
        assert!(matches!(
            registry.acquire(&id).await,
            Err(ApiError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let registry = registry();
        let stale = registry.create().await;
        let busy = registry.create().await;
        let _guard = registry.acquire(&busy).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fresh = registry.create().await;

        assert_eq!(registry.remove_idle(Duration::from_millis(10)).await, 1);
        assert!(matches!(
            registry.acquire(&stale).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(registry.acquire(&fresh).await.is_ok());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn acquiring_refreshes_idle_timer() {
        let registry = registry();
        let id = registry.create().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(registry.acquire(&id).await.unwrap());

        assert_eq!(registry.remove_idle(Duration::from_millis(10)).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn removed_sessions_are_not_found() {
        let registry = registry();
        let id = registry.create().await;
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(matches!(
            registry.acquire(&id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
