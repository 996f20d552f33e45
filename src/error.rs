//! Error types for the Memobridge engine
//!
//! All errors use thiserror for structured error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("Invalid schedule for activity '{name}': {reason}")]
    InvalidSchedule { name: String, reason: String },

    #[error("Mailer error: {0}")]
    Mailer(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
