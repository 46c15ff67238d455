use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventQuery, Result, Sequence, Snapshot,
    store::{AppendOptions, EventStore, EventStream, check_tail, validate_events_for_append},
};

/// In-memory event store.
///
/// The log is a plain vector whose index `i` holds sequence `i + 1`, which
/// keeps reads positional. Used for tests and for running without a database.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<String, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<Sequence> {
        validate_events_for_append(&events)?;

        let mut store = self.events.write().await;
        let current = Sequence::new(store.len() as i64);
        check_tail(current, events[0].sequence, &options)?;

        let last = events
            .last()
            .map(|e| e.sequence)
            .unwrap_or(Sequence::initial());
        let count = events.len();
        store.extend(events);

        tracing::debug!(%last, count, "appended events");
        metrics::counter!("event_store_appends_total", "store" => "memory").increment(1);
        Ok(last)
    }

    async fn get_events_from(&self, from: Sequence) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let skip = (from.as_i64().max(1) - 1) as usize;
        Ok(store.iter().skip(skip).cloned().collect())
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(store
            .iter()
            .filter(|e| query.matches(e))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        Ok(store
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn current_sequence(&self) -> Result<Sequence> {
        Ok(Sequence::new(self.events.read().await.len() as i64))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        match snapshots.get(&snapshot.aggregate_type) {
            Some(existing) if !snapshot.supersedes(existing) => {
                tracing::debug!(
                    sequence = %snapshot.sequence,
                    kept = %existing.sequence,
                    "ignoring stale snapshot"
                );
            }
            _ => {
                snapshots.insert(snapshot.aggregate_type.clone(), snapshot);
            }
        }
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_type: &str) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(aggregate_type).cloned())
    }
}
