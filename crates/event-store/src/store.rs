use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventEnvelope, EventQuery, EventStoreError, Result, Sequence, Snapshot};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected tail sequence of the log for optimistic concurrency control.
    /// If None, only the contiguity of the new events is checked.
    pub expected_sequence: Option<Sequence>,
}

impl AppendOptions {
    /// Creates options with no tail check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the log to end at `sequence`.
    pub fn expect_sequence(sequence: Sequence) -> Self {
        Self {
            expected_sequence: Some(sequence),
        }
    }

    /// Creates options expecting the log to be empty.
    pub fn expect_empty() -> Self {
        Self {
            expected_sequence: Some(Sequence::initial()),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event log implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the tail of the log.
    ///
    /// Events are appended atomically - either all succeed or none do. The
    /// first event must carry the sequence right after the current tail.
    /// If `options.expected_sequence` is set, the operation fails with
    /// `ConcurrencyConflict` when the tail doesn't match.
    ///
    /// Returns the sequence of the last appended event.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions)
    -> Result<Sequence>;

    /// Retrieves every event from `from` (inclusive) in sequence order.
    async fn get_events_from(&self, from: Sequence) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query, in sequence order.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events by type, in sequence order.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams all events in the store in sequence order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the sequence of the last event, or `Sequence::initial()` when empty.
    async fn current_sequence(&self) -> Result<Sequence>;

    /// Saves a snapshot, replacing any earlier one for the same aggregate type.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for an aggregate type.
    async fn get_snapshot(&self, aggregate_type: &str) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(
        &self,
        event: EventEnvelope,
        options: AppendOptions,
    ) -> Result<Sequence> {
        self.append(vec![event], options).await
    }

    /// Checks whether anything has been appended yet.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.current_sequence().await? == Sequence::initial())
    }

    /// Loads the events needed to rebuild an aggregate.
    ///
    /// If a snapshot exists, returns it and the events after it.
    /// Otherwise, returns None and all events.
    async fn load_stream(
        &self,
        aggregate_type: &str,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(aggregate_type).await? {
            let events = self.get_events_from(snapshot.replay_from()).await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.get_events_from(Sequence::first()).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates events before appending.
///
/// The batch must be non-empty and its sequences contiguous.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "Cannot append empty event list".to_string(),
        ));
    };

    if first.sequence < Sequence::first() {
        return Err(EventStoreError::InvalidAppend(format!(
            "Event sequences start at 1, got {}",
            first.sequence
        )));
    }

    let mut expected = first.sequence;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.sequence != expected {
            return Err(EventStoreError::InvalidAppend(format!(
                "Event sequences must be contiguous. Expected {}, got {}",
                expected, event.sequence
            )));
        }
    }

    Ok(())
}

/// Checks a batch against the current tail of the log.
pub(crate) fn check_tail(
    current: Sequence,
    first_new: Sequence,
    options: &AppendOptions,
) -> Result<()> {
    if let Some(expected) = options.expected_sequence
        && current != expected
    {
        return Err(EventStoreError::conflict(expected, current));
    }

    if first_new != current.next() {
        return Err(EventStoreError::conflict(
            options.expected_sequence.unwrap_or(current),
            current,
        ));
    }

    Ok(())
}
