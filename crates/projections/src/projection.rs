//! Core projection trait and position tracking.

use async_trait::async_trait;
use domain::LedgerEvent;
use event_store::{EventEnvelope, Sequence};

use crate::{ProjectionError, Result};

/// Tracks how far into the log a projection has read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Sequence of the last event handled.
    pub sequence: Sequence,

    /// Number of events processed by this projection.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position before the first event.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position past `sequence`.
    pub fn advance(&self, sequence: Sequence) -> Self {
        Self {
            sequence,
            events_processed: self.events_processed + 1,
        }
    }

    /// Returns true if the event at `sequence` was already handled.
    pub fn has_seen(&self, sequence: Sequence) -> bool {
        sequence <= self.sequence
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position({}, {} events)",
            self.sequence, self.events_processed
        )
    }
}

/// A projection that processes events and updates a read model.
///
/// Projections are the mechanism by which events are transformed into
/// denormalized read models optimized for queries.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

/// Decodes a ledger event, or returns `None` for kinds the ledger does not
/// emit.
pub fn decode_ledger_event(event: &EventEnvelope) -> Result<Option<LedgerEvent>> {
    if !LedgerEvent::KINDS.contains(&event.event_type.as_str()) {
        return Ok(None);
    }
    event
        .decode()
        .map(Some)
        .map_err(|source| ProjectionError::MalformedEvent {
            event_type: event.event_type.clone(),
            sequence: event.sequence,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.events_processed, 0);
        assert_eq!(pos.sequence, Sequence::initial());
    }

    #[test]
    fn position_advances() {
        let pos = ProjectionPosition::zero();
        let pos = pos.advance(Sequence::new(1));
        assert_eq!(pos.events_processed, 1);
        let pos = pos.advance(Sequence::new(2));
        assert_eq!(pos.events_processed, 2);
        assert!(pos.has_seen(Sequence::new(2)));
        assert!(!pos.has_seen(Sequence::new(3)));
    }

    #[test]
    fn position_display() {
        let pos = ProjectionPosition {
            sequence: Sequence::new(42),
            events_processed: 40,
        };
        assert_eq!(pos.to_string(), "position(42, 40 events)");
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let event = EventEnvelope::builder("SomethingElse", Sequence::first())
            .payload_raw(serde_json::json!({}))
            .build();
        assert!(decode_ledger_event(&event).unwrap().is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let event = EventEnvelope::builder(LedgerEvent::PRODUCT_CREATED, Sequence::first())
            .payload_raw(serde_json::json!({"nope": true}))
            .build();
        let err = decode_ledger_event(&event).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::MalformedEvent { ref event_type, sequence, .. }
                if event_type == "ProductCreated" && sequence == Sequence::first()
        ));
    }
}
