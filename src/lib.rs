//! Terminal chat client for a financial analysis agent backend.
//!
//! A query is submitted to `POST /api/send-request`, then
//! `GET /api/get-response` is polled until the backend returns the agents'
//! analysis, which is shown as chat bubbles.

pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod driver;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod ui;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use conversation::{Conversation, Message, MessageKind};
pub use error::ApiError;
pub use session::{ChatSession, SendOutcome};
