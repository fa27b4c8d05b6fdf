//! SQLite implementations of the dialog engine's persistence seams.
//!
//! Thin adapters over the record-access functions: each call checks a
//! connection out of the pool for its own duration.

use std::sync::Arc;

use super::db::{get_connection, DbPool};
use super::{contests, dialog_states};
use crate::core::error::AppResult;
use crate::dialog::{ContestDirectory, DialogState, DialogStateStore};
use crate::storage::types::{Contest, ContestNotification, ContestParticipant};

#[derive(Clone)]
pub struct SqliteContestDirectory {
    pool: Arc<DbPool>,
}

impl SqliteContestDirectory {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl ContestDirectory for SqliteContestDirectory {
    fn list_contests(&self) -> AppResult<Vec<Contest>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::list_contests(&conn)?)
    }

    fn get_contest(&self, id: i64) -> AppResult<Option<Contest>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::get_contest(&conn, id)?)
    }

    fn get_contest_by_name(&self, name: &str) -> AppResult<Option<Contest>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::get_contest_by_name(&conn, name)?)
    }

    fn list_participations(&self, participant_id: &str) -> AppResult<Vec<ContestParticipant>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::list_participations(&conn, participant_id)?)
    }

    fn list_contest_participants(&self, contest_id: i64) -> AppResult<Vec<ContestParticipant>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::list_contest_participants(&conn, contest_id)?)
    }

    fn save_participant(&self, participant: &mut ContestParticipant) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::save_participant(&conn, participant)?)
    }

    fn list_notifications(&self, contest_id: i64) -> AppResult<Vec<ContestNotification>> {
        let conn = get_connection(&self.pool)?;
        Ok(contests::list_notifications(&conn, contest_id)?)
    }
}

#[derive(Clone)]
pub struct SqliteDialogStateStore {
    pool: Arc<DbPool>,
}

impl SqliteDialogStateStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl DialogStateStore for SqliteDialogStateStore {
    fn get(&self, participant_id: &str) -> AppResult<Option<DialogState>> {
        let conn = get_connection(&self.pool)?;
        dialog_states::get_dialog_state(&conn, participant_id)
    }

    fn upsert(&self, state: &DialogState) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        dialog_states::upsert_dialog_state(&conn, state)
    }

    fn delete(&self, participant_id: &str) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        dialog_states::delete_dialog_state(&conn, participant_id)
    }
}
