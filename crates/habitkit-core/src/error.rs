//! Core error types for habitkit-core.
//!
//! This module defines the error hierarchy using thiserror
//! for better error handling and reporting across the library.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for habitkit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// No habit exists for the given id
    #[error("No habit found with id '{0}'")]
    HabitNotFound(String),

    /// A write was rejected by the backing store.
    ///
    /// `CompletionStore::toggle` reverts its optimistic local flip when it
    /// sees this; the caller surfaces it and may re-trigger the action.
    #[error("Write rejected by the backing store: {0}")]
    WriteRejected(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors, raised at habit creation/update time before persistence.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Habit name must be non-empty
    #[error("Habit name must not be empty")]
    EmptyName,

    /// A specific-weekdays schedule needs at least one weekday
    #[error("Schedule with specific weekdays requires at least one weekday")]
    EmptyWeekdays,

    /// Weekday index outside 0-6 (0 = Sunday)
    #[error("Weekday index {0} out of range (expected 0-6, 0 = Sunday)")]
    WeekdayOutOfRange(u8),

    /// Weekly quota outside 1-7
    #[error("Weekly quota {0} out of range (expected 1-7)")]
    QuotaOutOfRange(u8),

    /// Invalid date range
    #[error("Invalid date range: end_date ({end}) must not precede start_date ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    /// Out of bounds list index
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
