use thiserror::Error;

use crate::{Revision, StreamId};

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Two writers raced on the same stream; the expected revision did not
    /// match the revision actually persisted. The loser must reload and
    /// retry rather than overwrite the other's entries.
    #[error(
        "Concurrency conflict on stream {stream_id}: expected revision {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        stream_id: StreamId,
        expected: Revision,
        actual: Revision,
    },

    /// The stream has no entries.
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// A batch of entries failed pre-append validation.
    #[error("Invalid append batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
