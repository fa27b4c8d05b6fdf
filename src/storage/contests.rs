//! Contest, registration and notification record access.
//!
//! Plain functions over a pooled connection, one per query, mirroring the
//! narrow read/append contract the dialog engine relies on. Contests are
//! written by the admin interface; the bot only reads them (`save_contest`
//! exists for that interface and for test fixtures).

use rusqlite::{params, OptionalExtension, Result, Row};

use super::db::DbConnection;
use super::types::{Contest, ContestNotification, ContestParticipant};
use crate::core::credentials;

fn contest_from_row(row: &Row) -> Result<Contest> {
    Ok(Contest {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        when: row.get(3)?,
        venue: row.get(4)?,
        closed: row.get::<_, i64>(5)? != 0,
        hidden: row.get::<_, i64>(6)? != 0,
    })
}

const CONTEST_COLUMNS: &str = "id, name, description, when_text, venue, closed, hidden";

/// Lists all contests, ordered by id.
pub fn list_contests(conn: &DbConnection) -> Result<Vec<Contest>> {
    let mut stmt = conn.prepare(&format!("SELECT {CONTEST_COLUMNS} FROM contests ORDER BY id"))?;
    let rows = stmt.query_map([], contest_from_row)?;
    rows.collect()
}

/// One contest by id.
pub fn get_contest(conn: &DbConnection, id: i64) -> Result<Option<Contest>> {
    conn.query_row(
        &format!("SELECT {CONTEST_COLUMNS} FROM contests WHERE id = ?1"),
        params![id],
        contest_from_row,
    )
    .optional()
}

/// Finds a contest by its exact name.
pub fn get_contest_by_name(conn: &DbConnection, name: &str) -> Result<Option<Contest>> {
    conn.query_row(
        &format!("SELECT {CONTEST_COLUMNS} FROM contests WHERE name = ?1 ORDER BY id LIMIT 1"),
        params![name],
        contest_from_row,
    )
    .optional()
}

/// Creates a new contest or updates an existing one (admin interface and
/// test fixtures; the dialog engine never writes contests).
pub fn save_contest(conn: &DbConnection, contest: &mut Contest) -> Result<()> {
    if contest.id != 0 {
        conn.execute(
            "UPDATE contests
             SET name = ?1, description = ?2, when_text = ?3, venue = ?4, closed = ?5, hidden = ?6
             WHERE id = ?7",
            params![
                contest.name,
                contest.description,
                contest.when,
                contest.venue,
                contest.closed as i64,
                contest.hidden as i64,
                contest.id,
            ],
        )?;
    } else {
        conn.execute(
            "INSERT INTO contests (name, description, when_text, venue, closed, hidden)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                contest.name,
                contest.description,
                contest.when,
                contest.venue,
                contest.closed as i64,
                contest.hidden as i64,
            ],
        )?;
        contest.id = conn.last_insert_rowid();
    }
    Ok(())
}

fn participant_from_row(row: &Row) -> Result<ContestParticipant> {
    Ok(ContestParticipant {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        contest_id: row.get(2)?,
        name: row.get(3)?,
        school: row.get(4)?,
        contacts: row.get(5)?,
        languages: row.get(6)?,
        login: row.get(7)?,
        password: row.get(8)?,
    })
}

const PARTICIPANT_COLUMNS: &str =
    "id, participant_id, contest_id, name, school, contacts, languages, login, password";

/// Lists everyone registered for the given contest, ordered by id.
pub fn list_contest_participants(conn: &DbConnection, contest_id: i64) -> Result<Vec<ContestParticipant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM contest_participants WHERE contest_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![contest_id], participant_from_row)?;
    rows.collect()
}

/// All registrations held by one participant.
pub fn list_participations(conn: &DbConnection, participant_id: &str) -> Result<Vec<ContestParticipant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM contest_participants WHERE participant_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![participant_id], participant_from_row)?;
    rows.collect()
}

/// Creates a new registration or updates an existing one. Assigns the row
/// id and, where login/password are blank, the generated credentials;
/// existing credentials are never regenerated.
pub fn save_participant(conn: &DbConnection, participant: &mut ContestParticipant) -> Result<()> {
    credentials::ensure_credentials(participant);

    if participant.id != 0 {
        conn.execute(
            "UPDATE contest_participants
             SET participant_id = ?1, contest_id = ?2, name = ?3, school = ?4,
                 contacts = ?5, languages = ?6, login = ?7, password = ?8
             WHERE id = ?9",
            params![
                participant.participant_id,
                participant.contest_id,
                participant.name,
                participant.school,
                participant.contacts,
                participant.languages,
                participant.login,
                participant.password,
                participant.id,
            ],
        )?;
    } else {
        conn.execute(
            "INSERT INTO contest_participants
                 (participant_id, contest_id, name, school, contacts, languages, login, password)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                participant.participant_id,
                participant.contest_id,
                participant.name,
                participant.school,
                participant.contacts,
                participant.languages,
                participant.login,
                participant.password,
            ],
        )?;
        participant.id = conn.last_insert_rowid();
    }
    Ok(())
}

fn notification_from_row(row: &Row) -> Result<ContestNotification> {
    Ok(ContestNotification {
        id: row.get(0)?,
        contest_id: row.get(1)?,
        message: row.get(2)?,
    })
}

/// Lists notifications authored for the given contest, ordered by id.
pub fn list_notifications(conn: &DbConnection, contest_id: i64) -> Result<Vec<ContestNotification>> {
    let mut stmt =
        conn.prepare("SELECT id, contest_id, message FROM contest_notifications WHERE contest_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![contest_id], notification_from_row)?;
    rows.collect()
}

/// Creates a new notification or updates an existing one (admin interface).
pub fn save_notification(conn: &DbConnection, notification: &mut ContestNotification) -> Result<()> {
    if notification.id != 0 {
        conn.execute(
            "UPDATE contest_notifications SET contest_id = ?1, message = ?2 WHERE id = ?3",
            params![notification.contest_id, notification.message, notification.id],
        )?;
    } else {
        conn.execute(
            "INSERT INTO contest_notifications (contest_id, message) VALUES (?1, ?2)",
            params![notification.contest_id, notification.message],
        )?;
        notification.id = conn.last_insert_rowid();
    }
    Ok(())
}
