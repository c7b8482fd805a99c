//! Error types for csvfiler
//!
//! Provides a unified error type for all operations.
//!
//! `UnknownFile`, `DuplicateId` and `FileNotExist` are expected,
//! recoverable outcomes reported to the caller. `Io` during a mutating
//! call is reported only after the paired in-memory change has been
//! rolled back. `Parse` during startup load is unrecoverable for the
//! process.

use thiserror::Error;

/// Result type alias using FilerError
pub type Result<T> = std::result::Result<T, FilerError>;

/// Unified error type for csvfiler operations
#[derive(Debug, Error)]
pub enum FilerError {
    // -------------------------------------------------------------------------
    // Recoverable Caller Errors
    // -------------------------------------------------------------------------
    #[error("file not found in storage: {0}")]
    UnknownFile(String),

    #[error("id must be unique: {0}")]
    DuplicateId(u32),

    #[error("file does not exist on disk: {0}")]
    FileNotExist(String),

    // -------------------------------------------------------------------------
    // I/O and Load Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed id {token:?} in file {file}")]
    Parse { file: String, token: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl FilerError {
    /// Whether this error is an expected caller outcome rather than a
    /// storage or process failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FilerError::UnknownFile(_) | FilerError::DuplicateId(_) | FilerError::FileNotExist(_)
        )
    }
}
