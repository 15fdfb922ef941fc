//! Error types for puppy-core

use thiserror::Error;

use crate::models::EventId;

/// Result type alias using puppy-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in puppy-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The backing store is not currently connected
    #[error("Database connection not available")]
    Unavailable,

    /// An event with this id already exists
    #[error("Event already exists: {0}")]
    Conflict(EventId),

    /// No event with this id exists
    #[error("Event not found: {0}")]
    NotFound(EventId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl Error {
    /// Whether this error is a store/driver failure outside the known taxonomy.
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Database(_) | Self::LibSql(_))
    }
}
