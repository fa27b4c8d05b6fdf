//! Command router.
//!
//! Only consulted when the sender has no active dialog; once a dialog is
//! open, every message belongs to it (including `/cancel`, which the engine
//! intercepts itself).

use std::collections::HashMap;
use std::fmt::Write as _;

use super::markdown::escape_markdown as esc;
use crate::core::error::AppResult;
use crate::dialog::{DialogEngine, DialogType, InboundMessage};

const MSG_ENTER_COMMAND: &str = "Пожалуйста, введите команду. Для справки введите /help";
const MSG_UNKNOWN_COMMAND: &str = "Не знаю такой команды :(";
const MSG_START: &str = "Этот бот поможет зарегистрироваться на олимпиаду. Для справки введите /help";
const MSG_HELP: &str = "Этот бот поможет зарегистрироваться на олимпиаду. Доступные команды:\n\
                        /help - справка\n\
                        /contests - список контестов и сведения о регистрации\n\
                        /registration - регистрация на контест\n";
const MSG_CONTESTS_FAILED: &str = "Не удалось найти контесты :(";
const MSG_PARTICIPATION_FAILED: &str = "Не удалось найти регистрации на контесты :(";
const MSG_NO_CONTESTS: &str = "Сейчас контестов нет";

/// Routes a dialog-free message to its command.
pub async fn handle_command(engine: &DialogEngine, msg: &InboundMessage) -> AppResult<()> {
    if !msg.is_command {
        return engine.reply_plain(&msg.sender_id, MSG_ENTER_COMMAND).await;
    }

    match msg.command_name.as_str() {
        "start" => engine.reply_plain(&msg.sender_id, MSG_START).await,
        "help" => engine.reply_plain(&msg.sender_id, MSG_HELP).await,
        "contests" => command_contests(engine, msg).await,
        "registration" => {
            engine.begin_dialog(msg, DialogType::ChooseContest).await?;
            Ok(())
        }
        _ => engine.reply_plain(&msg.sender_id, MSG_UNKNOWN_COMMAND).await,
    }
}

/// Lists visible contests with the sender's registration details, if any.
async fn command_contests(engine: &DialogEngine, msg: &InboundMessage) -> AppResult<()> {
    let contests = match engine.directory().list_contests() {
        Ok(contests) => contests,
        Err(err) => {
            log::error!("/contests: unable to get contests: {}", err);
            return engine.reply_plain(&msg.sender_id, MSG_CONTESTS_FAILED).await;
        }
    };
    let participation = match engine.directory().list_participations(&msg.sender_id) {
        Ok(participation) => participation,
        Err(err) => {
            log::error!("/contests: unable to get participation: {}", err);
            return engine.reply_plain(&msg.sender_id, MSG_PARTICIPATION_FAILED).await;
        }
    };
    let by_contest: HashMap<i64, _> = participation.iter().map(|p| (p.contest_id, p)).collect();

    let mut message = String::from("Найдены контесты:\n");
    let mut found = false;

    for contest in &contests {
        if contest.hidden {
            continue;
        }
        found = true;

        let _ = writeln!(message, "\n*{}*", esc(&contest.name));
        let _ = writeln!(message, "*Что:* {}", esc(&contest.description));
        let _ = writeln!(message, "*Где:* {}", esc(&contest.venue));
        let _ = writeln!(message, "*Когда:* {}", esc(&contest.when));
        if contest.closed {
            message.push_str("_Регистрация на контест закрыта_\n");
        }

        if let Some(participant) = by_contest.get(&contest.id) {
            message.push_str("_Есть регистрация на контест_\n");
            let _ = writeln!(message, "*Имя:* {}", esc(&participant.name));
            let _ = writeln!(message, "*Школа/ВУЗ:* {}", esc(&participant.school));
            let _ = writeln!(message, "*Логин:* `{}`", participant.login);
            let _ = writeln!(message, "*Пароль:* `{}`", participant.password);
        }
    }

    if !found {
        return engine.reply_plain(&msg.sender_id, MSG_NO_CONTESTS).await;
    }
    engine.reply_markdown(&msg.sender_id, &message).await
}
