//! Dialogue-turn controller for a language-learning chat assistant.
//!
//! A [`ChatSession`] classifies each learner message, keeps the conversation
//! state, and lets the model call the language backend through a bounded
//! function-calling loop. Output goes to the host through an [`OutputSink`].

pub mod backend;
pub mod cache;
pub mod classifier;
pub mod dispatch;
pub mod error;
pub mod llm_client;
pub mod message;
pub mod output;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use backend::{AudioClip, AudioFormat, HttpLanguageBackend, LanguageBackend};
pub use error::{BackendError, LlmError, RegistryError, TurnError};
pub use llm_client::{ChatRequest, LLMClient, OpenAICompatibleClient};
pub use output::OutputSink;
pub use registry::FunctionRegistry;
pub use session::{ChatServices, ChatSession, SessionSettings};
pub use state::ConversationState;
