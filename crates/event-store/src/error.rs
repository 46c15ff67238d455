use thiserror::Error;

use crate::Sequence;

#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The log tail moved since the writer last read it.
    #[error("Concurrency conflict: expected sequence {expected}, found {actual}")]
    ConcurrencyConflict { expected: Sequence, actual: Sequence },

    /// The batch is empty, out of order or does not continue the log.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored payload, metadata map or snapshot failed to (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    pub(crate) fn conflict(expected: Sequence, actual: Sequence) -> Self {
        EventStoreError::ConcurrencyConflict { expected, actual }
    }

    /// Returns true if the append lost a race for the log tail.
    ///
    /// The writer can reload the log and decide again.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, EventStoreError>;
