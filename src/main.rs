use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use contestbot::core::{config, init_logger};
use contestbot::dialog::{DialogEngine, DialogRegistry};
use contestbot::storage::{create_pool, SqliteContestDirectory, SqliteDialogStateStore};
use contestbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramTransport};

/// Main entry point for the contest registration bot.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    init_logger(&config::LOG_FILE_PATH)?;
    log::info!("Starting contest registration bot");

    let pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    log::info!("Database ready at {}", *config::DATABASE_PATH);

    let bot = create_bot();
    if let Err(err) = setup_bot_commands(&bot).await {
        log::warn!("Unable to register bot commands: {}", err);
    }

    let engine = Arc::new(DialogEngine::new(
        DialogRegistry::standard(),
        Arc::new(SqliteContestDirectory::new(Arc::clone(&pool))),
        Arc::new(SqliteDialogStateStore::new(Arc::clone(&pool))),
        Arc::new(TelegramTransport::new(bot.clone())),
    ));

    Dispatcher::builder(bot, schema(HandlerDeps::new(engine)))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
