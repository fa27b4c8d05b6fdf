//! The conversation state machine.
//!
//! The engine drives every inbound chat message through a load → dispatch →
//! mutate → persist cycle. The collaborators it talks to — the contest
//! directory, the dialog state store and the chat transport — are seams, so
//! the whole machine runs against SQLite and Telegram in production and
//! against fakes in tests.

pub mod choose_contest;
pub mod engine;
pub mod registration;
pub mod registry;
pub mod state;

use async_trait::async_trait;

use crate::core::error::AppResult;
use crate::storage::types::{Contest, ContestNotification, ContestParticipant};

pub use engine::{DeliveryOutcome, DialogEngine, DispatchOutcome, StepOutcome};
pub use registry::{DialogRegistry, StepHandler};
pub use state::{DialogState, DialogType};

/// How an outbound message should be rendered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    /// Sent verbatim; the transport escapes whatever its wire format needs.
    Plain,
    /// Pre-rendered markup; the sender is responsible for escaping.
    Markdown,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a message, optionally presenting one-tap quick replies.
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        formatting: Formatting,
        quick_replies: Option<&[String]>,
    ) -> AppResult<()>;

    /// Withdraws previously presented quick replies.
    async fn remove_quick_replies(&self, recipient: &str) -> AppResult<()>;
}

/// Read/append access to contests and registrations. Blocking from the
/// engine's point of view.
pub trait ContestDirectory: Send + Sync {
    /// All contests, ordered by id.
    fn list_contests(&self) -> AppResult<Vec<Contest>>;
    fn get_contest(&self, id: i64) -> AppResult<Option<Contest>>;
    fn get_contest_by_name(&self, name: &str) -> AppResult<Option<Contest>>;
    /// All registrations held by one participant.
    fn list_participations(&self, participant_id: &str) -> AppResult<Vec<ContestParticipant>>;
    /// Everyone registered for one contest, ordered by id.
    fn list_contest_participants(&self, contest_id: i64) -> AppResult<Vec<ContestParticipant>>;
    /// Assigns the record id and, where blank, generated credentials.
    fn save_participant(&self, participant: &mut ContestParticipant) -> AppResult<()>;
    fn list_notifications(&self, contest_id: i64) -> AppResult<Vec<ContestNotification>>;
}

/// Durable per-participant persistence for open conversations.
pub trait DialogStateStore: Send + Sync {
    fn get(&self, participant_id: &str) -> AppResult<Option<DialogState>>;
    fn upsert(&self, state: &DialogState) -> AppResult<()>;
    fn delete(&self, participant_id: &str) -> AppResult<()>;
}

/// One inbound chat message, already stripped down to what the engine and
/// the command router need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Opaque chat/session identifier of the sender.
    pub sender_id: String,
    pub text: String,
    pub is_command: bool,
    pub command_name: String,
    pub command_args: String,
}

impl InboundMessage {
    /// Builds a message, recognizing `/command@botname args` forms.
    pub fn from_text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();

        let mut is_command = false;
        let mut command_name = String::new();
        let mut command_args = String::new();

        if let Some(body) = trimmed.strip_prefix('/') {
            if !body.is_empty() {
                let mut parts = body.splitn(2, char::is_whitespace);
                if let Some(token) = parts.next() {
                    let name = token.split('@').next().unwrap_or(token);
                    if !name.is_empty() {
                        is_command = true;
                        command_name = name.to_string();
                        command_args = parts.next().unwrap_or("").trim().to_string();
                    }
                }
            }
        }

        Self {
            sender_id: sender_id.into(),
            text,
            is_command,
            command_name,
            command_args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_not_a_command() {
        let msg = InboundMessage::from_text("42", "Winter Cup");
        assert!(!msg.is_command);
        assert_eq!(msg.text, "Winter Cup");
        assert_eq!(msg.command_name, "");
    }

    #[test]
    fn command_with_args() {
        let msg = InboundMessage::from_text("42", "/registration  Winter Cup ");
        assert!(msg.is_command);
        assert_eq!(msg.command_name, "registration");
        assert_eq!(msg.command_args, "Winter Cup");
    }

    #[test]
    fn bot_mention_suffix_is_stripped() {
        let msg = InboundMessage::from_text("42", "/help@contest_bot");
        assert!(msg.is_command);
        assert_eq!(msg.command_name, "help");
        assert_eq!(msg.command_args, "");
    }

    #[test]
    fn bare_slash_is_not_a_command() {
        let msg = InboundMessage::from_text("42", "/");
        assert!(!msg.is_command);
    }
}
