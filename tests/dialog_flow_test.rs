//! End-to-end dialog engine tests over a real SQLite database and a
//! recording transport fake.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use contestbot::dialog::state::{DialogPosition, RegistrationStep};
use contestbot::dialog::{
    DialogEngine, DialogRegistry, DialogState, DialogStateStore, DialogType, DispatchOutcome, Formatting,
    InboundMessage, Transport,
};
use contestbot::storage::types::{Contest, ContestNotification, ContestParticipant};
use contestbot::storage::{contests, dialog_states, create_pool, get_connection, DbPool};
use contestbot::storage::{SqliteContestDirectory, SqliteDialogStateStore};
use contestbot::{AppError, AppResult};

const CHAT: &str = "100500";

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Message {
        recipient: String,
        text: String,
        formatting: Formatting,
        quick_replies: Option<Vec<String>>,
    },
    KeyboardRemoved {
        recipient: String,
    },
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    fn all(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } => Some(text),
                Sent::KeyboardRemoved { .. } => None,
            })
            .collect()
    }

    fn last_text(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }

    fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        formatting: Formatting,
        quick_replies: Option<&[String]>,
    ) -> AppResult<()> {
        self.sent.lock().unwrap().push(Sent::Message {
            recipient: recipient.to_string(),
            text: text.to_string(),
            formatting,
            quick_replies: quick_replies.map(|q| q.to_vec()),
        });
        Ok(())
    }

    async fn remove_quick_replies(&self, recipient: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(Sent::KeyboardRemoved {
            recipient: recipient.to_string(),
        });
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    pool: Arc<DbPool>,
    transport: Arc<RecordingTransport>,
    engine: Arc<DialogEngine>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.sqlite");
    let pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());
    let transport = Arc::new(RecordingTransport::default());
    let engine = Arc::new(DialogEngine::new(
        DialogRegistry::standard(),
        Arc::new(SqliteContestDirectory::new(Arc::clone(&pool))),
        Arc::new(SqliteDialogStateStore::new(Arc::clone(&pool))),
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));
    Fixture {
        _dir: dir,
        pool,
        transport,
        engine,
    }
}

impl Fixture {
    fn seed_contest(&self, name: &str, closed: bool, hidden: bool) -> Contest {
        let conn = get_connection(&self.pool).unwrap();
        let mut contest = Contest {
            name: name.to_string(),
            description: "School olympiad".to_string(),
            when: "2026-09-12 10:00".to_string(),
            venue: "Room 404".to_string(),
            closed,
            hidden,
            ..Contest::default()
        };
        contests::save_contest(&conn, &mut contest).unwrap();
        contest
    }

    fn update_contest(&self, contest: &mut Contest) {
        let conn = get_connection(&self.pool).unwrap();
        contests::save_contest(&conn, contest).unwrap();
    }

    fn seed_participant(&self, participant_id: &str, contest_id: i64) -> ContestParticipant {
        let conn = get_connection(&self.pool).unwrap();
        let mut participant = ContestParticipant {
            participant_id: participant_id.to_string(),
            contest_id,
            name: "Petrov P. P.".to_string(),
            ..ContestParticipant::default()
        };
        contests::save_participant(&conn, &mut participant).unwrap();
        participant
    }

    fn state_of(&self, participant_id: &str) -> Option<DialogState> {
        let conn = get_connection(&self.pool).unwrap();
        dialog_states::get_dialog_state(&conn, participant_id).unwrap()
    }

    fn participations(&self, participant_id: &str) -> Vec<ContestParticipant> {
        let conn = get_connection(&self.pool).unwrap();
        contests::list_participations(&conn, participant_id).unwrap()
    }

    /// Opens the selection dialog and picks the contest, landing on the
    /// name question.
    async fn open_registration(&self, contest_name: &str) {
        let outcome = self
            .engine
            .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::InProgress);

        let outcome = self.engine.dispatch(&msg(contest_name)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::InProgress);
        assert_eq!(
            self.transport.last_text(),
            "Начинаем регистрацию на контест. Введите Ваше имя:"
        );
    }
}

fn msg(text: &str) -> InboundMessage {
    InboundMessage::from_text(CHAT, text)
}

#[tokio::test]
async fn message_without_dialog_is_left_to_commands() {
    let fx = fixture();
    let outcome = fx.engine.dispatch(&msg("hello")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoActiveDialog);
    assert!(fx.transport.all().is_empty());
}

#[tokio::test]
async fn full_registration_flow() {
    let fx = fixture();
    let contest = fx.seed_contest("Winter Cup", false, false);
    fx.seed_contest("Secret Round", false, true);
    fx.seed_contest("Autumn Round", true, false);

    let outcome = fx
        .engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::InProgress);

    // Only the open, visible contest is offered.
    let sent = fx.transport.all();
    match sent.last().unwrap() {
        Sent::Message {
            text, quick_replies, ..
        } => {
            assert!(text.starts_with("Выберите доступный для регистрации контест"));
            assert_eq!(quick_replies.as_deref(), Some(&["Winter Cup".to_string()][..]));
        }
        other => panic!("unexpected outbound item: {:?}", other),
    }

    // Choosing the contest removes the keyboard and asks for the name in
    // the same turn.
    let outcome = fx.engine.dispatch(&msg("Winter Cup")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::InProgress);
    assert!(fx
        .transport
        .all()
        .contains(&Sent::KeyboardRemoved { recipient: CHAT.into() }));
    assert_eq!(
        fx.transport.last_text(),
        "Начинаем регистрацию на контест. Введите Ваше имя:"
    );

    fx.engine.dispatch(&msg("Petrov P. P.")).await.unwrap();
    assert!(fx.transport.last_text().starts_with("Введите название Вашей школы"));

    fx.engine.dispatch(&msg("School #5, 11th grade")).await.unwrap();
    assert!(fx.transport.last_text().starts_with("Введите Ваши контактные данные"));

    fx.engine.dispatch(&msg("+7 900 000-00-00")).await.unwrap();
    assert!(fx.transport.last_text().starts_with("И последний вопрос"));

    let outcome = fx.engine.dispatch(&msg("Rust, VS Code")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);

    let summary = fx.transport.last_text();
    assert!(summary.contains("Регистрация завершена"));
    assert!(summary.contains("*Логин:* `p_"));
    assert!(summary.contains("*Пароль:* `"));

    let rows = fx.participations(CHAT);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.contest_id, contest.id);
    assert_eq!(row.name, "Petrov P. P.");
    assert_eq!(row.school, "School #5, 11th grade");
    assert_eq!(row.contacts, "+7 900 000-00-00");
    assert_eq!(row.languages, "Rust, VS Code");
    assert!(row.login.starts_with("p_"));
    assert_eq!(row.login.chars().count(), 7);
    assert_eq!(row.password.chars().count(), 10);

    assert_eq!(fx.state_of(CHAT), None);
}

#[tokio::test]
async fn cancel_aborts_dialog_at_any_step() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);
    fx.open_registration("Winter Cup").await;

    fx.engine.dispatch(&msg("Petrov P. P.")).await.unwrap();

    let outcome = fx.engine.dispatch(&msg("/cancel")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Cancelled);
    assert_eq!(fx.transport.last_text(), "Отменено");
    assert_eq!(fx.state_of(CHAT), None);
    assert!(fx.participations(CHAT).is_empty());
}

#[tokio::test]
async fn duplicate_registration_is_rejected_at_choice() {
    let fx = fixture();
    let contest = fx.seed_contest("Winter Cup", false, false);
    fx.seed_participant(CHAT, contest.id);

    fx.engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await
        .unwrap();
    let outcome = fx.engine.dispatch(&msg("Winter Cup")).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(fx.transport.last_text(), "На этот контест уже есть регистрация");
    assert_eq!(fx.state_of(CHAT), None);
    assert_eq!(fx.participations(CHAT).len(), 1);
}

#[tokio::test]
async fn long_answers_are_capped_per_field() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);
    fx.open_registration("Winter Cup").await;

    // 250 characters at every step; each field has its own cap.
    fx.engine.dispatch(&msg(&"я".repeat(250))).await.unwrap();
    fx.engine.dispatch(&msg(&"ш".repeat(250))).await.unwrap();
    fx.engine.dispatch(&msg(&"к".repeat(250))).await.unwrap();
    let outcome = fx.engine.dispatch(&msg(&"р".repeat(250))).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);

    let rows = fx.participations(CHAT);
    assert_eq!(rows[0].name.chars().count(), 100);
    assert_eq!(rows[0].school.chars().count(), 200);
    assert_eq!(rows[0].contacts.chars().count(), 100);
    assert_eq!(rows[0].languages.chars().count(), 200);
}

#[tokio::test]
async fn empty_answer_reasks_without_advancing() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);
    fx.open_registration("Winter Cup").await;

    let outcome = fx.engine.dispatch(&msg("   \n ")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::InProgress);
    assert_eq!(fx.transport.last_text(), "Попробуйте ввести имя еще раз");

    let state = fx.state_of(CHAT).unwrap();
    assert_eq!(state.position, DialogPosition::Registration(RegistrationStep::Name));

    fx.engine.dispatch(&msg("Petrov P. P.")).await.unwrap();
    assert!(fx.transport.last_text().starts_with("Введите название Вашей школы"));
}

#[tokio::test]
async fn languages_answer_may_be_empty() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);
    fx.open_registration("Winter Cup").await;

    fx.engine.dispatch(&msg("Petrov P. P.")).await.unwrap();
    fx.engine.dispatch(&msg("School #5")).await.unwrap();
    fx.engine.dispatch(&msg("p@example.com")).await.unwrap();
    let outcome = fx.engine.dispatch(&msg("  ")).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(fx.participations(CHAT)[0].languages, "");
}

#[tokio::test]
async fn corrupted_state_self_heals_with_one_reply() {
    let fx = fixture();
    {
        let conn = get_connection(&fx.pool).unwrap();
        conn.execute(
            "INSERT INTO dialog_states (participant_id, dialog_type, dialog_step, values_json)
             VALUES (?1, 'quiz', 'zero', '{}')",
            [CHAT],
        )
        .unwrap();
    }

    let outcome = fx.engine.dispatch(&msg("hello")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Recovered);
    assert_eq!(fx.transport.texts(), vec!["Произошла ошибка :( Попробуйте еще раз".to_string()]);
    assert_eq!(fx.state_of(CHAT), None);

    // The next message goes back to the command router.
    let outcome = fx.engine.dispatch(&msg("hello")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoActiveDialog);
}

#[tokio::test]
async fn nothing_open_for_registration() {
    let fx = fixture();
    fx.seed_contest("Autumn Round", true, false);
    fx.seed_contest("Secret Round", false, true);

    let outcome = fx
        .engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(fx.transport.last_text(), "Доступных для регистрации контестов нет");
    assert_eq!(fx.state_of(CHAT), None);
}

#[tokio::test]
async fn contest_closed_between_listing_and_choice() {
    let fx = fixture();
    let mut contest = fx.seed_contest("Winter Cup", false, false);

    fx.engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await
        .unwrap();

    contest.closed = true;
    fx.update_contest(&mut contest);

    let outcome = fx.engine.dispatch(&msg("Winter Cup")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(fx.transport.last_text(), "Регистрация на этот контест закрыта :(");
    assert_eq!(fx.state_of(CHAT), None);
}

#[tokio::test]
async fn unknown_contest_name_ends_the_dialog() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);

    fx.engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await
        .unwrap();

    let outcome = fx.engine.dispatch(&msg("Summer Cup")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(fx.transport.last_text(), "Контест не найден :(");
    assert_eq!(fx.state_of(CHAT), None);
}

#[tokio::test]
async fn notifications_fan_out_to_every_participant() {
    let fx = fixture();
    let contest = fx.seed_contest("Winter Cup", false, false);
    fx.seed_participant("1", contest.id);
    fx.seed_participant("2", contest.id);
    fx.seed_participant("", contest.id); // unreachable, skipped

    let handle = fx
        .engine
        .notify_contest_participants(contest.id, "Venue changed to Room 405")
        .unwrap();
    let deliveries = handle.await.unwrap();

    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.iter().all(|d| d.result.is_ok()));

    let sent = fx.transport.all();
    assert_eq!(sent.len(), 2);
    for item in &sent {
        match item {
            Sent::Message { text, formatting, .. } => {
                assert_eq!(*formatting, Formatting::Markdown);
                assert!(text.starts_with("*Оповещение участников контеста \"Winter Cup\"*:"));
                assert!(text.contains("Venue changed to Room 405"));
            }
            other => panic!("unexpected outbound item: {:?}", other),
        }
    }
}

#[tokio::test]
async fn stored_notifications_can_be_broadcast() {
    let fx = fixture();
    let contest = fx.seed_contest("Winter Cup", false, false);
    fx.seed_participant("1", contest.id);
    {
        let conn = get_connection(&fx.pool).unwrap();
        let mut notification = ContestNotification {
            contest_id: contest.id,
            message: "Doors open at 9:30".to_string(),
            ..ContestNotification::default()
        };
        contests::save_notification(&conn, &mut notification).unwrap();
    }

    let stored = fx.engine.directory().list_notifications(contest.id).unwrap();
    assert_eq!(stored.len(), 1);

    let handle = fx
        .engine
        .notify_contest_participants(contest.id, &stored[0].message)
        .unwrap();
    let deliveries = handle.await.unwrap();
    assert_eq!(deliveries.len(), 1);
    assert!(fx.transport.last_text().contains("Doors open at 9:30"));
}

#[tokio::test]
async fn notifying_missing_contest_fails_fast() {
    let fx = fixture();
    let err = fx.engine.notify_contest_participants(9000, "text");
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_turns_of_one_participant_serialize() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);
    fx.open_registration("Winter Cup").await;

    let first_msg = msg("Petrov P. P.");
    let second_msg = msg("School #5");
    let first = fx.engine.dispatch(&first_msg);
    let second = fx.engine.dispatch(&second_msg);
    let (a, b) = tokio::join!(first, second);
    assert_eq!(a.unwrap(), DispatchOutcome::InProgress);
    assert_eq!(b.unwrap(), DispatchOutcome::InProgress);

    // Whatever the interleaving, both answers landed and the dialog sits
    // two steps further.
    let state = fx.state_of(CHAT).unwrap();
    assert_eq!(state.position, DialogPosition::Registration(RegistrationStep::Contacts));
}

/// State store whose saves always fail; reads and deletes pass through.
struct FlakyStateStore {
    inner: SqliteDialogStateStore,
}

impl DialogStateStore for FlakyStateStore {
    fn get(&self, participant_id: &str) -> AppResult<Option<DialogState>> {
        self.inner.get(participant_id)
    }

    fn upsert(&self, _state: &DialogState) -> AppResult<()> {
        Err(AppError::Validation("storage offline".to_string()))
    }

    fn delete(&self, participant_id: &str) -> AppResult<()> {
        self.inner.delete(participant_id)
    }
}

#[tokio::test]
async fn failed_save_reports_and_replies() {
    let fx = fixture();
    fx.seed_contest("Winter Cup", false, false);

    let flaky_engine = DialogEngine::new(
        DialogRegistry::standard(),
        Arc::new(SqliteContestDirectory::new(Arc::clone(&fx.pool))),
        Arc::new(FlakyStateStore {
            inner: SqliteDialogStateStore::new(Arc::clone(&fx.pool)),
        }),
        Arc::clone(&fx.transport) as Arc<dyn Transport>,
    );
    fx.transport.clear();

    let result = flaky_engine
        .begin_dialog(&msg("/registration"), DialogType::ChooseContest)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(
        fx.transport.last_text(),
        "Не удалось сохранить данные :(\nПопробуйте еще раз"
    );
    assert_eq!(fx.state_of(CHAT), None);
}
