//! Core utilities: configuration, errors, logging, credentials.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod utils;

pub use error::{AppError, AppResult};
pub use logging::init_logger;
