//! The dialog engine: load → dispatch → mutate → persist for every inbound
//! message, plus cancellation, self-healing and the notification fan-out.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::registry::DialogRegistry;
use super::state::{DialogState, DialogType};
use super::{ContestDirectory, DialogStateStore, Formatting, InboundMessage, Transport};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::telegram::markdown::escape_markdown as esc;

const MSG_CANCELLED: &str = "Отменено";
const MSG_ERROR_SHORT: &str = "Произошла ошибка :(";
const MSG_GENERIC_ERROR: &str = "Произошла ошибка :( Попробуйте еще раз";
const MSG_SAVE_FAILED: &str = "Не удалось сохранить данные :(\nПопробуйте еще раз";

/// What one step handler reports back to the engine.
#[derive(Debug)]
pub struct StepOutcome {
    /// The conversation finished (or self-terminated); delete its state.
    pub done: bool,
    /// The handler rewrote the state to point at another dialog; re-resolve
    /// and continue within the same inbound message.
    pub handoff: bool,
    /// Logged by the engine; does not by itself delete or corrupt state.
    pub error: Option<AppError>,
}

impl StepOutcome {
    /// The dialog advanced (or stayed put) and waits for the next message.
    pub fn pending() -> Self {
        Self {
            done: false,
            handoff: false,
            error: None,
        }
    }

    pub fn pending_with(error: Option<AppError>) -> Self {
        Self {
            error,
            ..Self::pending()
        }
    }

    /// The conversation is over, successfully or not.
    pub fn finished() -> Self {
        Self {
            done: true,
            handoff: false,
            error: None,
        }
    }

    pub fn finished_with(error: Option<AppError>) -> Self {
        Self {
            error,
            ..Self::finished()
        }
    }

    /// The state now points at a different dialog; keep processing.
    pub fn handed_off() -> Self {
        Self {
            done: false,
            handoff: true,
            error: None,
        }
    }
}

/// How the engine disposed of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No persisted dialog; the message belongs to the command router.
    NoActiveDialog,
    /// The dialog advanced and now waits for the next message.
    InProgress,
    /// The dialog finished and its state was deleted.
    Completed,
    /// The participant sent the cancel keyword.
    Cancelled,
    /// Corrupted state was deleted; the participant got one generic reply.
    Recovered,
}

/// Per-recipient result of a notification broadcast.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub participant_id: String,
    pub result: AppResult<()>,
}

/// Orchestrates every open conversation. Owns the step table and the
/// collaborator seams; all of them are handed in at construction, there are
/// no process-wide singletons.
pub struct DialogEngine {
    registry: DialogRegistry,
    directory: Arc<dyn ContestDirectory>,
    states: Arc<dyn DialogStateStore>,
    transport: Arc<dyn Transport>,
    /// One mutex per participant: a turn's load-mutate-persist sequence,
    /// including any handoff chain, never interleaves with another turn of
    /// the same participant. Turns of different participants run freely.
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DialogEngine {
    pub fn new(
        registry: DialogRegistry,
        directory: Arc<dyn ContestDirectory>,
        states: Arc<dyn DialogStateStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            directory,
            states,
            transport,
            turn_locks: DashMap::new(),
        }
    }

    pub fn directory(&self) -> &dyn ContestDirectory {
        self.directory.as_ref()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Drives one inbound message through the active dialog, if any.
    ///
    /// Every failure path sends exactly one reply and leaves the persisted
    /// state in a defined condition; see the outcome variants.
    pub async fn dispatch(&self, msg: &InboundMessage) -> AppResult<DispatchOutcome> {
        let lock = self.turn_lock(&msg.sender_id);
        let result = {
            let _turn = lock.lock().await;
            self.dispatch_turn(msg).await
        };
        self.release_turn_lock(&msg.sender_id, lock);
        result
    }

    async fn dispatch_turn(&self, msg: &InboundMessage) -> AppResult<DispatchOutcome> {
        let state = match self.states.get(&msg.sender_id) {
            Ok(state) => state,
            Err(err @ AppError::UnknownDialog { .. }) => {
                log::error!("dispatch: corrupted dialog state for {}: {}", msg.sender_id, err);
                self.self_heal(&msg.sender_id).await;
                return Ok(DispatchOutcome::Recovered);
            }
            Err(err) => {
                log::error!("dispatch: unable to load dialog state for {}: {}", msg.sender_id, err);
                self.reply_best_effort(&msg.sender_id, MSG_GENERIC_ERROR).await;
                return Err(err);
            }
        };

        let Some(mut state) = state else {
            return Ok(DispatchOutcome::NoActiveDialog);
        };

        // Cancellation wins over step dispatch, at every step of every dialog.
        if msg.text.trim() == config::dialog::CANCEL_COMMAND {
            return self.cancel(&msg.sender_id).await;
        }

        self.run_steps(msg, &mut state).await
    }

    /// Opens a fresh dialog for the sender and runs its first step(s)
    /// within the same turn. Used by the command router, which only fires
    /// when the sender has no active dialog.
    pub async fn begin_dialog(&self, msg: &InboundMessage, dialog: DialogType) -> AppResult<DispatchOutcome> {
        let lock = self.turn_lock(&msg.sender_id);
        let result = {
            let _turn = lock.lock().await;
            let mut state = DialogState::opening(msg.sender_id.as_str(), dialog);
            self.run_steps(msg, &mut state).await
        };
        self.release_turn_lock(&msg.sender_id, lock);
        result
    }

    /// Fans `text` out to every participant of the contest on a background
    /// task. Individual delivery failures are logged and captured per
    /// recipient; they never stop the broadcast.
    pub fn notify_contest_participants(
        &self,
        contest_id: i64,
        text: &str,
    ) -> AppResult<JoinHandle<Vec<DeliveryOutcome>>> {
        let contest = self
            .directory
            .get_contest(contest_id)?
            .ok_or_else(|| AppError::NotFound(format!("contest {contest_id}")))?;
        let participants = self.directory.list_contest_participants(contest_id)?;

        let message = format!(
            "*Оповещение участников контеста \"{}\"*:\n\n{}",
            esc(&contest.name),
            esc(text)
        );

        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move {
            let mut deliveries = Vec::with_capacity(participants.len());
            for participant in participants {
                if participant.participant_id.is_empty() {
                    continue;
                }
                let result = transport
                    .send(&participant.participant_id, &message, Formatting::Markdown, None)
                    .await;
                if let Err(err) = &result {
                    log::error!(
                        "unable to send contest {} notification to {}: {}",
                        contest_id,
                        participant.participant_id,
                        err
                    );
                }
                deliveries.push(DeliveryOutcome {
                    participant_id: participant.participant_id,
                    result,
                });
            }
            deliveries
        });

        Ok(handle)
    }

    /// Resolve-invoke-persist, with handoffs as a bounded loop instead of
    /// recursion so a miswired chain cannot grow the stack.
    async fn run_steps(&self, msg: &InboundMessage, state: &mut DialogState) -> AppResult<DispatchOutcome> {
        let mut hops: u32 = 0;

        let done = loop {
            let handler = match self.registry.resolve(state.position) {
                Ok(handler) => handler,
                Err(err) => {
                    log::error!("dispatch: no handler for state of {}: {}", state.participant_id, err);
                    self.self_heal(&state.participant_id).await;
                    return Ok(DispatchOutcome::Recovered);
                }
            };

            let outcome = handler(self, msg, state).await;

            if let Some(err) = &outcome.error {
                if err.is_participant_fault() {
                    log::info!("dialog step {:?} for {}: {}", state.position, state.participant_id, err);
                } else {
                    log::error!("dialog step {:?} for {}: {}", state.position, state.participant_id, err);
                }
            }

            if outcome.handoff {
                hops += 1;
                if hops > config::dialog::MAX_HANDOFFS {
                    log::error!("dialog handoff limit exceeded for {}", state.participant_id);
                    self.self_heal(&state.participant_id).await;
                    return Ok(DispatchOutcome::Recovered);
                }
                continue;
            }

            break outcome.done;
        };

        if done {
            if let Err(err) = self.states.delete(&state.participant_id) {
                log::error!("unable to delete dialog state {}: {}", state.participant_id, err);
                self.reply_best_effort(&state.participant_id, MSG_ERROR_SHORT).await;
                return Err(err);
            }
            Ok(DispatchOutcome::Completed)
        } else {
            if let Err(err) = self.states.upsert(state) {
                log::error!("unable to save dialog state {}: {}", state.participant_id, err);
                self.reply_best_effort(&state.participant_id, MSG_SAVE_FAILED).await;
                return Err(err);
            }
            Ok(DispatchOutcome::InProgress)
        }
    }

    async fn cancel(&self, participant_id: &str) -> AppResult<DispatchOutcome> {
        match self.states.delete(participant_id) {
            Ok(()) => {
                self.reply_best_effort(participant_id, MSG_CANCELLED).await;
                Ok(DispatchOutcome::Cancelled)
            }
            Err(err) => {
                log::error!("unable to delete dialog state {}: {}", participant_id, err);
                self.reply_best_effort(participant_id, MSG_ERROR_SHORT).await;
                Err(err)
            }
        }
    }

    /// Deletes state nobody can handle and tells the participant, once.
    async fn self_heal(&self, participant_id: &str) {
        if let Err(err) = self.states.delete(participant_id) {
            log::error!("unable to delete corrupted dialog state {}: {}", participant_id, err);
        }
        self.reply_best_effort(participant_id, MSG_GENERIC_ERROR).await;
    }

    pub(crate) async fn reply_plain(&self, recipient: &str, text: &str) -> AppResult<()> {
        self.transport.send(recipient, text, Formatting::Plain, None).await
    }

    pub(crate) async fn reply_markdown(&self, recipient: &str, text: &str) -> AppResult<()> {
        self.transport.send(recipient, text, Formatting::Markdown, None).await
    }

    pub(crate) async fn reply_best_effort(&self, recipient: &str, text: &str) {
        if let Err(err) = self.reply_plain(recipient, text).await {
            log::error!("unable to send reply to {}: {}", recipient, err);
        }
    }

    fn turn_lock(&self, participant_id: &str) -> Arc<Mutex<()>> {
        self.turn_locks.entry(participant_id.to_string()).or_default().clone()
    }

    /// Drops the caller's lock handle and evicts the map entry unless
    /// another in-flight turn still holds a clone, so the map stays bounded
    /// by concurrent senders rather than growing by one entry per sender
    /// for the process lifetime.
    fn release_turn_lock(&self, participant_id: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.turn_locks
            .remove_if(participant_id, |_, remaining| Arc::strong_count(remaining) == 1);
    }
}
