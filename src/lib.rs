//! Contestbot - Telegram bot that registers participants for programming contests
//!
//! This library provides the full bot: the dialog engine that drives the
//! multi-turn conversations, the SQLite-backed storage for contests,
//! registrations and in-progress dialog states, and the Telegram integration.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, credential generation
//! - `storage`: SQLite pool, migrations and record access
//! - `dialog`: the conversation state machine, step registry and handlers
//! - `telegram`: teloxide transport, command routing and dispatcher schema

pub mod core;
pub mod dialog;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use dialog::{DialogEngine, DialogRegistry, DispatchOutcome, InboundMessage};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
