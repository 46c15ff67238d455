//! Projection error types.

use event_store::{EventStoreError, Sequence};
use thiserror::Error;

/// Errors that stop a projection from consuming the log.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Reading the log failed.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A ledger event's payload does not match its kind.
    #[error("Malformed {event_type} payload at sequence {sequence}: {source}")]
    MalformedEvent {
        event_type: String,
        sequence: Sequence,
        source: serde_json::Error,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
