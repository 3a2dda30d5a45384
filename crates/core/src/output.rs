//! Outgoing events towards the hosting front end.

use crate::backend::AudioClip;
use async_trait::async_trait;

/// Capability the host hands to a session at construction time. Calls are
/// fire-and-forget: implementations forward to their transport and must not
/// block the turn for long.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// A message meant for the learner (translation, breakdown, answer).
    async fn send_text(&self, text: String);

    /// Synthesized speech.
    async fn send_audio(&self, clip: AudioClip);

    /// Status or error information about the conversation itself.
    async fn send_status(&self, status: String);
}
