use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Dialog state (de)serialization errors
    #[error("state encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Telegram API errors
    #[error("telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// A contest or participant record is absent
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid free-text input; recovered locally by re-prompting
    #[error("validation error: {0}")]
    Validation(String),

    /// The participant already holds a registration for the contest
    #[error("participant {participant_id} is already registered to contest {contest_id}")]
    DuplicateRegistration { participant_id: String, contest_id: i64 },

    /// Persisted dialog state points at a (type, step) pair nobody handles.
    /// Self-healed by deleting the state, never propagated to the user
    /// beyond a single generic reply.
    #[error("unknown dialog position {dialog_type}.{dialog_step}")]
    UnknownDialog { dialog_type: String, dialog_step: String },
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Errors that come from the participant's own input or an expected
    /// business outcome, logged below `error` level by the engine.
    pub fn is_participant_fault(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::Validation(_) | AppError::DuplicateRegistration { .. }
        )
    }
}
