//! Error types for qjournal
//!
//! Provides a unified error type for all journal operations.

use thiserror::Error;

/// Result type alias using JournalError
pub type Result<T> = std::result::Result<T, JournalError>;

/// Unified error type for journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    /// Raised while decoding a record. Replay treats it as end of valid data.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl JournalError {
    /// True for errors caused by a bad journal configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, JournalError::InvalidConfiguration(_))
    }

    /// True for errors caused by the underlying storage
    pub fn is_storage(&self) -> bool {
        matches!(self, JournalError::Io(_))
    }
}

impl From<bincode::Error> for JournalError {
    fn from(e: bincode::Error) -> Self {
        JournalError::Serialization(e.to_string())
    }
}
