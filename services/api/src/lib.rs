//! Lingobot API Library Crate
//!
//! Configuration, shared state, routing, the WebSocket chat front end and
//! the console front end.
//! The binaries in `bin/` are thin wrappers around this library.

pub mod config;
pub mod console;
pub mod router;
pub mod state;
pub mod ws;
