use std::sync::Arc;

use super::controller::ConversationController;
use crate::llm::GenerationClient;
use crate::prompt::PromptComposer;
use crate::rag::Retriever;

/// Components shared by every session; each session gets its own
/// controller and transcript.
#[derive(Clone)]
pub struct ChatPipeline {
    retriever: Arc<dyn Retriever>,
    composer: PromptComposer,
    generator: GenerationClient,
    max_input_length: usize,
}

impl ChatPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        composer: PromptComposer,
        generator: GenerationClient,
        max_input_length: usize,
    ) -> Self {
        Self {
            retriever,
            composer,
            generator,
            max_input_length,
        }
    }

    pub fn new_controller(&self) -> ConversationController {
        ConversationController::new(
            self.retriever.clone(),
            self.composer.clone(),
            self.generator.clone(),
            self.max_input_length,
        )
    }
}
