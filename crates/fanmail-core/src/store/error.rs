//! Storage error types.

use thiserror::Error;

/// Errors from local key storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying storage failed (disk, database, injected fault).
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(String),

    /// Attempted to remove the record the latest pointer refers to.
    #[error("refusing to remove the latest key")]
    LatestKey,
}
