//! SQLite-backed storage: pool, migrations and record access.

pub mod contests;
pub mod db;
pub mod dialog_states;
pub mod directory;
pub mod migrations;
pub mod types;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use directory::{SqliteContestDirectory, SqliteDialogStateStore};
