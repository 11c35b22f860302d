//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Error originating from the weather station API client (`reqwest`).
    #[error("API Error: {0}")]
    Api(Arc<reqwest::Error>),

    /// Error originating from database operations (`sqlx`).
    #[error("Database Error: {0}")]
    Db(Arc<sqlx::Error>),

    /// A write collided with the (station, timestamp, type) uniqueness constraint.
    ///
    /// Expected when two ingestion runs race between the dedup read and the insert.
    #[error("Integrity Error: {0}")]
    Integrity(String),

    /// Stored data that could not be decoded back into the domain model.
    #[error("Storage Error: {0}")]
    Storage(String),

    /// Error during JSON parsing (`serde_json`).
    #[error("JSON Parsing Error: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Caller supplied input that violates a precondition. No I/O has happened.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Invalid runtime configuration (bind address, schedule time, log sink).
    #[error("Configuration Error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether this error is a uniqueness violation raised by the store.
    pub fn is_integrity(&self) -> bool {
        matches!(self, AppError::Integrity(_))
    }
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api(Arc::new(err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations get their own variant so callers can tell a lost
        // insert race apart from a broken connection.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Integrity(db_err.message().to_string());
            }
        }
        AppError::Db(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}
