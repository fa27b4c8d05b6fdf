//! Telegram integration: bot setup, outbound transport, command router and
//! the dispatcher schema.

pub mod bot;
pub mod commands;
pub mod markdown;
pub mod schema;
pub mod transport;

pub use bot::{create_bot, inbound_from_message, setup_bot_commands};
pub use schema::{schema, HandlerDeps, HandlerError};
pub use transport::TelegramTransport;
