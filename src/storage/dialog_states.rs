//! Persistence for in-progress dialog states.
//!
//! One row per participant with an open conversation, keyed by the opaque
//! participant id. Rows that no longer decode (schema drift, manual edits)
//! surface as [`AppError::UnknownDialog`] so the engine can self-heal.

use rusqlite::{params, OptionalExtension};

use super::db::DbConnection;
use crate::core::error::{AppError, AppResult};
use crate::dialog::DialogState;

/// Current dialog state of the given participant, if any.
pub fn get_dialog_state(conn: &DbConnection, participant_id: &str) -> AppResult<Option<DialogState>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT dialog_type, dialog_step, values_json FROM dialog_states WHERE participant_id = ?1",
            params![participant_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    match row {
        Some((dialog_type, dialog_step, values_json)) => {
            DialogState::decode(participant_id, &dialog_type, &dialog_step, &values_json).map(Some)
        }
        None => Ok(None),
    }
}

/// Saves the given dialog state, replacing any previous one.
pub fn upsert_dialog_state(conn: &DbConnection, state: &DialogState) -> AppResult<()> {
    if state.participant_id.is_empty() {
        return Err(AppError::Validation(
            "saving dialog state with empty participant id".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO dialog_states (participant_id, dialog_type, dialog_step, values_json, updated_at)
         VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
         ON CONFLICT (participant_id) DO UPDATE SET
             dialog_type = excluded.dialog_type,
             dialog_step = excluded.dialog_step,
             values_json = excluded.values_json,
             updated_at = excluded.updated_at",
        params![
            state.participant_id,
            state.position.dialog_type().to_string(),
            state.position.step_name(),
            state.encode_values()?,
        ],
    )?;
    Ok(())
}

/// Removes the given participant's dialog state. Removing an absent state
/// is not an error.
pub fn delete_dialog_state(conn: &DbConnection, participant_id: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM dialog_states WHERE participant_id = ?1",
        params![participant_id],
    )?;
    Ok(())
}
