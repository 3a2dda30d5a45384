//! WebSocket Chat Sessions
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle and the per-connection chat session.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
