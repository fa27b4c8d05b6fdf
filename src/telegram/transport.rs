//! Telegram-backed implementation of the outbound transport seam.
//!
//! Everything goes out as MarkdownV2; plain text is escaped here so callers
//! never worry about reserved characters. Quick replies map to a one-time
//! reply keyboard, one button per row.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode, ReplyMarkup};

use super::markdown::escape_markdown;
use crate::core::error::{AppError, AppResult};
use crate::dialog::{Formatting, Transport};

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn parse_chat_id(recipient: &str) -> AppResult<ChatId> {
    recipient
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| AppError::Validation(format!("malformed chat id \"{recipient}\"")))
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        formatting: Formatting,
        quick_replies: Option<&[String]>,
    ) -> AppResult<()> {
        let chat_id = parse_chat_id(recipient)?;
        let text = match formatting {
            Formatting::Plain => escape_markdown(text),
            Formatting::Markdown => text.to_string(),
        };

        let mut request = self.bot.send_message(chat_id, text).parse_mode(ParseMode::MarkdownV2);
        if let Some(labels) = quick_replies {
            let rows: Vec<Vec<KeyboardButton>> = labels
                .iter()
                .map(|label| vec![KeyboardButton::new(label.clone())])
                .collect();
            let keyboard = KeyboardMarkup::new(rows).one_time_keyboard();
            request = request.reply_markup(ReplyMarkup::Keyboard(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn remove_quick_replies(&self, recipient: &str) -> AppResult<()> {
        let chat_id = parse_chat_id(recipient)?;
        // Bot API can only drop a reply keyboard alongside a message.
        self.bot
            .send_message(chat_id, escape_markdown("..."))
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(ReplyMarkup::KeyboardRemove(KeyboardRemove::new()))
            .await?;
        Ok(())
    }
}
