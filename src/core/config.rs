use once_cell::sync::Lazy;
use std::env;

/// Configuration constants for the bot

/// Path to the SQLite database file.
/// Read once at startup from the DATABASE_PATH environment variable.
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "contestbot.sqlite".to_string()));

/// Path to the log file.
/// Read once at startup from the LOG_FILE environment variable.
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE").unwrap_or_else(|_| "contestbot.log".to_string()));

/// Dialog engine configuration
pub mod dialog {
    /// Keyword that aborts any dialog at any step.
    pub const CANCEL_COMMAND: &str = "/cancel";

    /// Maximum number of synchronous dialog handoffs within one inbound
    /// message. Choose-contest hands off into registration once; anything
    /// deeper means corrupted state.
    pub const MAX_HANDOFFS: u32 = 2;
}

/// Maximum lengths of registration fields, in characters (not bytes).
pub mod fields {
    pub const NAME_MAX_CHARS: usize = 100;
    pub const SCHOOL_MAX_CHARS: usize = 200;
    pub const CONTACTS_MAX_CHARS: usize = 100;
    pub const LANGUAGES_MAX_CHARS: usize = 200;
}

/// Shape of generated participant credentials.
pub mod credentials {
    /// Every generated login starts with this prefix.
    pub const LOGIN_PREFIX: &str = "p_";

    /// Length of the generated part of the login, after the prefix.
    pub const LOGIN_SUFFIX_CHARS: usize = 5;

    /// Length of the generated password.
    pub const PASSWORD_CHARS: usize = 10;
}
