//! Storage error types.

use thiserror::Error;

/// Errors returned by [`crate::Storage`] implementations.
///
/// Both variants are recoverable from the session's point of view: a failed
/// write leaves the in-memory copy authoritative, a failed read falls back to
/// defaults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying database or filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}
