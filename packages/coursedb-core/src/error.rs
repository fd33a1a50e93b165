//! Database error types.

use thiserror::Error;

/// Database operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Course not found
    #[error("Course {id} not found")]
    CourseNotFound { id: u64 },

    /// Referenced student does not exist
    #[error("Invalid pk \"{id}\" - student does not exist")]
    StudentNotFound { id: u64 },

    /// Payload violates a field constraint
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: &'static str, message: String },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}
