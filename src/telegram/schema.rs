//! Dispatcher schema.
//!
//! One message endpoint: the dialog engine gets the first look at every
//! text message, and only when it reports no active dialog does the command
//! router run. Dispatch failures are already logged and answered by the
//! engine, so the endpoint swallows them instead of tearing down polling.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::bot::inbound_from_message;
use super::commands::handle_command;
use crate::dialog::{DialogEngine, DispatchOutcome};

/// Error type for handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers.
#[derive(Clone)]
pub struct HandlerDeps {
    pub engine: Arc<DialogEngine>,
}

impl HandlerDeps {
    pub fn new(engine: Arc<DialogEngine>) -> Self {
        Self { engine }
    }
}

/// The complete handler tree for the bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(message_handler(deps))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |msg: Message| {
        let deps = deps.clone();
        async move {
            let Some(inbound) = inbound_from_message(&msg) else {
                return Ok(());
            };

            match deps.engine.dispatch(&inbound).await {
                Ok(DispatchOutcome::NoActiveDialog) => {
                    if let Err(err) = handle_command(&deps.engine, &inbound).await {
                        log::error!("command /{}: {}", inbound.command_name, err);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::error!("dispatch for {}: {}", inbound.sender_id, err);
                }
            }

            Ok(())
        }
    })
}
