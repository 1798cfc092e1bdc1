pub mod about;
pub mod chat;
pub mod core;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod reviews;
pub mod server;
pub mod state;
