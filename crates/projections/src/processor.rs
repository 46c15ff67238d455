//! Projection processor for feeding events to projections.

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::Result;
use crate::projection::Projection;

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays the log to bring projections up to date
/// - Single event delivery: delivers a new event to every projection that
///   has not seen it yet
/// - Live delivery: follows a broadcast of committed events
/// - Rebuild: resets all projections and replays from scratch
///
/// Deliveries are serialized, so a live feed and on-demand catch-ups can
/// share one processor without handling an event twice.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    delivery: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            delivery: Mutex::new(()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Runs catch-up processing: streams all events from the store and delivers
    /// them to each projection that hasn't already seen them.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        self.catch_up_locked().await
    }

    /// Delivers a single event to all registered projections.
    ///
    /// Projections that already handled the event's sequence skip it.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type, sequence = %event.sequence))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        self.deliver(event).await
    }

    /// Follows committed events until the sender side closes.
    ///
    /// When the receiver falls behind and misses events, the gap is filled
    /// from the store before continuing.
    #[tracing::instrument(skip_all)]
    pub async fn run_live(&self, mut receiver: broadcast::Receiver<EventEnvelope>) -> Result<()> {
        loop {
            match receiver.recv().await {
                Ok(event) => self.process_event(&event).await?,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "projection feed lagged, catching up from store");
                    self.run_catch_up().await?;
                }
                Err(RecvError::Closed) => {
                    tracing::info!("event feed closed");
                    return Ok(());
                }
            }
        }
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.catch_up_locked().await
    }

    /// Must be called with the delivery lock held.
    async fn catch_up_locked(&self) -> Result<()> {
        let mut stream = self.store.stream_all_events().await?;
        let mut events_read: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            events_read += 1;
            self.deliver(&event).await?;
        }

        tracing::debug!(events_read, "catch-up complete");

        Ok(())
    }

    /// Must be called with the delivery lock held.
    async fn deliver(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            if projection.position().await.has_seen(event.sequence) {
                continue;
            }
            projection.handle(event).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }
        Ok(())
    }
}
