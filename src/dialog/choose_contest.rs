//! Contest selection dialog.
//!
//! Two steps: list the contests open for registration as one-tap quick
//! replies, then resolve the tapped name and hand the state off to the
//! registration dialog. Eligibility is re-checked at choice time because a
//! contest can be closed or hidden between the two messages.

use futures_util::future::BoxFuture;

use super::engine::{DialogEngine, StepOutcome};
use super::state::{
    ChooseContestStep, DialogPosition, DialogState, DialogValues, RegistrationStep, RegistrationValues,
};
use super::InboundMessage;
use crate::core::error::AppError;

const MSG_LIST_FAILED: &str = "Не удалось найти контесты :(";
const MSG_NOTHING_OPEN: &str = "Доступных для регистрации контестов нет";
const MSG_CHOOSE: &str = "Выберите доступный для регистрации контест.\nНажмите на кнопку с названием контеста";
const MSG_LOOKUP_FAILED: &str = "Не удалось найти контест с указанным именем :(";
const MSG_NOT_FOUND: &str = "Контест не найден :(";
const MSG_GONE: &str = "Этот контест больше не существует :(";
const MSG_CLOSED: &str = "Регистрация на этот контест закрыта :(";
const MSG_WENT_WRONG: &str = "Что-то пошло не так :(";
const MSG_ALREADY_REGISTERED: &str = "На этот контест уже есть регистрация";

/// Presents the contests open for registration.
pub fn zero<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        let contests = match engine.directory().list_contests() {
            Ok(contests) => contests,
            Err(err) => {
                engine.reply_best_effort(&msg.sender_id, MSG_LIST_FAILED).await;
                return StepOutcome::finished_with(Some(err));
            }
        };

        let names: Vec<String> = contests
            .into_iter()
            .filter(|contest| !contest.hidden && !contest.closed)
            .map(|contest| contest.name)
            .collect();

        if names.is_empty() {
            let sent = engine.reply_plain(&msg.sender_id, MSG_NOTHING_OPEN).await;
            return StepOutcome::finished_with(sent.err());
        }

        state.position = DialogPosition::ChooseContest(ChooseContestStep::Choice);

        let sent = engine
            .transport()
            .send(&msg.sender_id, MSG_CHOOSE, super::Formatting::Plain, Some(&names))
            .await;
        StepOutcome::pending_with(sent.err())
    })
}

/// Resolves the tapped contest name and hands off to registration.
pub fn choice<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        // The keyboard was one-time, but only for the client that tapped it.
        if let Err(err) = engine.transport().remove_quick_replies(&msg.sender_id).await {
            engine.reply_best_effort(&msg.sender_id, MSG_WENT_WRONG).await;
            return StepOutcome::finished_with(Some(err));
        }

        let contest = match engine.directory().get_contest_by_name(msg.text.trim()) {
            Ok(Some(contest)) => contest,
            Ok(None) => {
                let sent = engine.reply_plain(&msg.sender_id, MSG_NOT_FOUND).await;
                return StepOutcome::finished_with(
                    sent.err()
                        .or_else(|| Some(AppError::NotFound(format!("contest \"{}\"", msg.text.trim())))),
                );
            }
            Err(err) => {
                engine.reply_best_effort(&msg.sender_id, MSG_LOOKUP_FAILED).await;
                return StepOutcome::finished_with(Some(err));
            }
        };

        if contest.hidden {
            let sent = engine.reply_plain(&msg.sender_id, MSG_GONE).await;
            return StepOutcome::finished_with(
                sent.err()
                    .or_else(|| Some(AppError::NotFound(format!("contest {} is hidden", contest.id)))),
            );
        }
        if contest.closed {
            let sent = engine.reply_plain(&msg.sender_id, MSG_CLOSED).await;
            return StepOutcome::finished_with(
                sent.err()
                    .or_else(|| Some(AppError::Validation(format!("contest {} is closed", contest.id)))),
            );
        }

        let participations = match engine.directory().list_participations(&msg.sender_id) {
            Ok(participations) => participations,
            Err(err) => {
                engine.reply_best_effort(&msg.sender_id, MSG_WENT_WRONG).await;
                return StepOutcome::finished_with(Some(err));
            }
        };
        if participations.iter().any(|p| p.contest_id == contest.id) {
            let sent = engine.reply_plain(&msg.sender_id, MSG_ALREADY_REGISTERED).await;
            return StepOutcome::finished_with(sent.err().or_else(|| {
                Some(AppError::DuplicateRegistration {
                    participant_id: msg.sender_id.clone(),
                    contest_id: contest.id,
                })
            }));
        }

        state.position = DialogPosition::Registration(RegistrationStep::Zero);
        state.values = DialogValues::Registration(RegistrationValues::for_contest(contest.id));
        StepOutcome::handed_off()
    })
}
