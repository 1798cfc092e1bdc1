//! Conversation sessions: the question cycle state machine, its transcript,
//! and the registry the HTTP surface keeps sessions in.

mod controller;
mod pipeline;
pub mod render;
mod sessions;
mod transcript;

pub use controller::{ControllerState, ConversationController};
pub use pipeline::ChatPipeline;
pub use sessions::SessionRegistry;
pub use transcript::{Role, Transcript, Turn};
