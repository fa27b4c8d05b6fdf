//! Registration dialog.
//!
//! Entered by handoff from contest selection with the contest id already in
//! the values. Collects name, school, contacts and preferred languages one
//! message at a time, then writes the participant row and reports the
//! generated credentials. Empty input re-asks the same question without
//! touching the collected values; only the languages answer may be blank.

use futures_util::future::BoxFuture;

use super::engine::{DialogEngine, StepOutcome};
use super::state::{DialogPosition, DialogState, RegistrationStep};
use super::InboundMessage;
use crate::core::error::AppError;
use crate::core::{config, utils};
use crate::storage::types::ContestParticipant;
use crate::telegram::markdown::escape_markdown as esc;

const MSG_NAME_PROMPT: &str = "Начинаем регистрацию на контест. Введите Ваше имя:";
const MSG_NAME_RETRY: &str = "Попробуйте ввести имя еще раз";
const MSG_SCHOOL_PROMPT: &str = "Введите название Вашей школы или ВУЗа, а также класс (или курс и группу):";
const MSG_SCHOOL_RETRY: &str = "Попробуйте ввести название образовательной организации еще раз";
const MSG_CONTACTS_PROMPT: &str = "Введите Ваши контактные данные (номер телефона и адрес электронной почты):";
const MSG_CONTACTS_RETRY: &str = "Попробуйте ввести контакты еще раз";
const MSG_LANGUAGES_PROMPT: &str = "И последний вопрос, какие предпочитаете языки и среды программирования:";
const MSG_SAVE_FAILED: &str = "Не удалось зарегистрироваться на контест. Попробуйте еще раз";
const MSG_BROKEN: &str = "Ошибка регистрации :(";
const MSG_DONE: &str = "Регистрация завершена :)";

/// Opens the questionnaire. Reached by handoff, so the prompt goes out in
/// the same turn as the contest choice.
pub fn zero<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        state.position = DialogPosition::Registration(RegistrationStep::Name);
        let sent = engine.reply_plain(&msg.sender_id, MSG_NAME_PROMPT).await;
        StepOutcome::pending_with(sent.err())
    })
}

pub fn name<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        let input = utils::trim_to_chars(&msg.text, config::fields::NAME_MAX_CHARS);
        if input.is_empty() {
            let sent = engine.reply_plain(&msg.sender_id, MSG_NAME_RETRY).await;
            return StepOutcome::pending_with(sent.err());
        }

        let Some(values) = state.values.registration_mut() else {
            return broken_values(engine, msg, state).await;
        };
        values.name = Some(input);
        state.position = DialogPosition::Registration(RegistrationStep::School);

        let sent = engine.reply_plain(&msg.sender_id, MSG_SCHOOL_PROMPT).await;
        StepOutcome::pending_with(sent.err())
    })
}

pub fn school<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        let input = utils::trim_to_chars(&msg.text, config::fields::SCHOOL_MAX_CHARS);
        if input.is_empty() {
            let sent = engine.reply_plain(&msg.sender_id, MSG_SCHOOL_RETRY).await;
            return StepOutcome::pending_with(sent.err());
        }

        let Some(values) = state.values.registration_mut() else {
            return broken_values(engine, msg, state).await;
        };
        values.school = Some(input);
        state.position = DialogPosition::Registration(RegistrationStep::Contacts);

        let sent = engine.reply_plain(&msg.sender_id, MSG_CONTACTS_PROMPT).await;
        StepOutcome::pending_with(sent.err())
    })
}

pub fn contacts<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        let input = utils::trim_to_chars(&msg.text, config::fields::CONTACTS_MAX_CHARS);
        if input.is_empty() {
            let sent = engine.reply_plain(&msg.sender_id, MSG_CONTACTS_RETRY).await;
            return StepOutcome::pending_with(sent.err());
        }

        let Some(values) = state.values.registration_mut() else {
            return broken_values(engine, msg, state).await;
        };
        values.contacts = Some(input);
        state.position = DialogPosition::Registration(RegistrationStep::Languages);

        let sent = engine.reply_plain(&msg.sender_id, MSG_LANGUAGES_PROMPT).await;
        StepOutcome::pending_with(sent.err())
    })
}

/// Final step. The languages answer may be empty; the participant row is
/// written here and credentials come back filled in.
pub fn languages<'a>(
    engine: &'a DialogEngine,
    msg: &'a InboundMessage,
    state: &'a mut DialogState,
) -> BoxFuture<'a, StepOutcome> {
    Box::pin(async move {
        let languages = utils::trim_to_chars(&msg.text, config::fields::LANGUAGES_MAX_CHARS);

        let Some(values) = state.values.registration() else {
            return broken_values(engine, msg, state).await;
        };
        let mut participant = ContestParticipant {
            participant_id: state.participant_id.clone(),
            contest_id: values.contest_id,
            name: values.name.clone().unwrap_or_default(),
            school: values.school.clone().unwrap_or_default(),
            contacts: values.contacts.clone().unwrap_or_default(),
            languages,
            ..ContestParticipant::default()
        };

        if let Err(err) = engine.directory().save_participant(&mut participant) {
            engine.reply_best_effort(&msg.sender_id, MSG_SAVE_FAILED).await;
            return StepOutcome::finished_with(Some(err));
        }

        // Credentials are plain ASCII, safe inside code spans unescaped.
        let summary = format!(
            "{}\n*Логин:* `{}`\n*Пароль:* `{}`",
            esc(MSG_DONE),
            participant.login,
            participant.password
        );
        let sent = engine.reply_markdown(&msg.sender_id, &summary).await;
        StepOutcome::finished_with(sent.err())
    })
}

/// Values union does not belong to this dialog. Decoding normally rejects
/// such rows, so reaching this means the state was mutated mid-turn into an
/// inconsistent shape; end the conversation.
async fn broken_values(engine: &DialogEngine, msg: &InboundMessage, state: &DialogState) -> StepOutcome {
    engine.reply_best_effort(&msg.sender_id, MSG_BROKEN).await;
    StepOutcome::finished_with(Some(AppError::UnknownDialog {
        dialog_type: state.position.dialog_type().to_string(),
        dialog_step: state.position.step_name(),
    }))
}
