//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// The ledger rejected the command.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the ledger rejection, if this is one.
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            DomainError::Ledger(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if another writer extended the log first.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DomainError::EventStore(e) if e.is_conflict())
    }
}
