//! Bot instance creation and inbound message mapping.

use teloxide::prelude::*;
use teloxide::types::{BotCommand, Message};

use crate::dialog::InboundMessage;

/// Creates a Bot from the `TELOXIDE_TOKEN` environment variable.
pub fn create_bot() -> Bot {
    Bot::from_env()
}

/// Registers the command list shown in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "что умеет этот бот"),
        BotCommand::new("help", "справка по командам"),
        BotCommand::new("contests", "список контестов и сведения о регистрации"),
        BotCommand::new("registration", "регистрация на контест"),
        BotCommand::new("cancel", "отменить текущий диалог"),
    ])
    .await?;

    Ok(())
}

/// Maps a Telegram message to the transport-neutral inbound form. Non-text
/// messages (stickers, photos) are ignored.
pub fn inbound_from_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    Some(InboundMessage::from_text(msg.chat.id.0.to_string(), text))
}
