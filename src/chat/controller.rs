use std::fmt;
use std::sync::Arc;

use super::transcript::{Transcript, Turn};
use crate::core::errors::ChatError;
use crate::llm::GenerationClient;
use crate::prompt::PromptComposer;
use crate::rag::Retriever;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingRetrieval,
    AwaitingGeneration,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::AwaitingRetrieval => "awaiting_retrieval",
            ControllerState::AwaitingGeneration => "awaiting_generation",
        };
        f.write_str(name)
    }
}

/// Runs question → retrieval → generation cycles for one session and owns
/// its transcript.
///
/// A user turn is recorded as soon as a non-blank question is accepted; the
/// assistant turn only once generation succeeds. A failed cycle therefore
/// leaves the question in the transcript without an answer.
pub struct ConversationController {
    retriever: Arc<dyn Retriever>,
    composer: PromptComposer,
    generator: GenerationClient,
    max_input_length: usize,
    transcript: Transcript,
    state: ControllerState,
}

impl ConversationController {
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
            transcript: Transcript::new(),
            state: ControllerState::Idle,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one cycle and returns the committed assistant turn.
    pub async fn ask(&mut self, question: &str) -> Result<&Turn, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::InputEmpty);
        }
        if question.chars().count() > self.max_input_length {
            return Err(ChatError::InputTooLong {
                max: self.max_input_length,
            });
        }

        self.transcript.push(Turn::user(question));

        self.transition(ControllerState::AwaitingRetrieval);
        let reviews = match self.retriever.retrieve(question).await {
            Ok(reviews) => reviews,
            Err(err) => return Err(self.fail(err)),
        };

        self.transition(ControllerState::AwaitingGeneration);
        let prompt = self.composer.compose(question, &reviews);
        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(err) => return Err(self.fail(err)),
        };

        self.transition(ControllerState::Idle);
        Ok(self.transcript.push(Turn::assistant(answer, reviews)))
    }

    /// Resets the transcript. Taking `&mut self` means no cycle can be in
    /// flight.
    pub fn clear(&mut self) {
        tracing::info!("Clearing transcript ({} turns)", self.transcript.len());
        self.transcript.clear();
    }

    fn transition(&mut self, next: ControllerState) {
        tracing::debug!("Conversation {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: ChatError) -> ChatError {
        tracing::warn!("Question cycle failed during {}: {}", self.state, err);
        self.transition(ControllerState::Idle);
        err
    }
}
