//! Command handling infrastructure.

use std::sync::atomic::{AtomicI64, Ordering};

use common::ManufacturerId;
use event_store::{ACTOR_KEY, AppendOptions, EventEnvelope, EventStore, EventStoreExt, Sequence};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Metadata attached to every envelope produced by a command.
pub use event_store::Metadata;

/// Capacity of the committed-event broadcast channel.
const PUBLISH_CAPACITY: usize = 1024;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The envelopes as they were appended to the log.
    pub envelopes: Vec<EventEnvelope>,

    /// The log position after the command.
    pub new_sequence: Sequence,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// The identity issuing the command.
    fn actor(&self) -> &ManufacturerId;

    /// Envelope metadata recording who issued the command.
    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("command".to_string(), self.name().into());
        metadata.insert(ACTOR_KEY.to_string(), self.actor().as_str().into());
        metadata
    }
}

/// Handler for executing commands against a log-wide aggregate.
///
/// The handler keeps the aggregate in memory and is the single writer of its
/// log:
/// 1. Takes the writer lock, so commands are applied one at a time
/// 2. Catches up with events appended by anyone else
/// 3. Executes the command against the current state to produce events
/// 4. Appends the events, expecting the log tail it decided against
/// 5. Applies the events and publishes the envelopes to subscribers
///
/// Readers go through [`CommandHandler::read`] and always see the state
/// either fully before or fully after a command.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    state: RwLock<A>,
    writer: Mutex<()>,
    publisher: broadcast::Sender<EventEnvelope>,
    snapshot_interval: u64,
    last_snapshot: AtomicI64,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    ///
    /// The in-memory state starts empty; call [`CommandHandler::restore`]
    /// to load a log that already has events.
    pub fn new(store: S) -> Self {
        let (publisher, _) = broadcast::channel(PUBLISH_CAPACITY);
        Self {
            store,
            state: RwLock::new(A::default()),
            writer: Mutex::new(()),
            publisher,
            snapshot_interval: 0,
            last_snapshot: AtomicI64::new(0),
        }
    }

    /// Sets how many events may pass between snapshots (0 disables them).
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Subscribes to envelopes as they are committed, in log order.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.publisher.subscribe()
    }

    /// Runs `f` against a consistent view of the current state.
    pub async fn read<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Returns the position of the in-memory state.
    pub async fn sequence(&self) -> Sequence {
        self.state.read().await.sequence()
    }

    /// Rebuilds the in-memory state from the latest snapshot and the events
    /// after it.
    pub async fn restore(&self) -> Result<Sequence, DomainError>
    where
        A: DeserializeOwned,
    {
        let _writer = self.writer.lock().await;
        let (snapshot, events) = self.store.load_stream(A::aggregate_type()).await?;

        let mut aggregate = match snapshot {
            Some(snapshot) => {
                let sequence = snapshot.sequence;
                self.last_snapshot.store(sequence.as_i64(), Ordering::Release);
                let mut aggregate: A = snapshot.into_state()?;
                aggregate.set_sequence(sequence);
                aggregate
            }
            None => A::default(),
        };
        for (sequence, event) in decode(events)? {
            aggregate.apply(event);
            aggregate.set_sequence(sequence);
        }

        let sequence = aggregate.sequence();
        *self.state.write().await = aggregate;
        tracing::info!(
            aggregate = A::aggregate_type(),
            %sequence,
            "restored aggregate"
        );
        Ok(sequence)
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error. Nothing is written when
    /// it fails or returns no events.
    pub async fn execute<F>(
        &self,
        metadata: Metadata,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error> + Send,
        DomainError: From<A::Error>,
    {
        let _writer = self.writer.lock().await;
        self.execute_locked(metadata, command_fn).await
    }

    /// Must be called with the writer lock held.
    async fn execute_locked<F>(
        &self,
        metadata: Metadata,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error> + Send,
        DomainError: From<A::Error>,
    {
        self.catch_up().await?;

        let (events, current) = {
            let state = self.state.read().await;
            (command_fn(&state)?, state.sequence())
        };

        if events.is_empty() {
            return Ok(CommandResult {
                events,
                envelopes: vec![],
                new_sequence: current,
            });
        }

        let envelopes = build_envelopes(current, &events, &metadata)?;

        // Persist with optimistic concurrency on the log tail
        let new_sequence = self
            .store
            .append(envelopes.clone(), AppendOptions::expect_sequence(current))
            .await?;

        {
            let mut state = self.state.write().await;
            state.apply_events(events.iter().cloned());
            state.set_sequence(new_sequence);
        }

        for envelope in &envelopes {
            // No subscribers is not an error
            let _ = self.publisher.send(envelope.clone());
        }

        Ok(CommandResult {
            events,
            envelopes,
            new_sequence,
        })
    }

    /// Applies events that reached the store without going through this
    /// handler. Must be called with the writer lock held.
    async fn catch_up(&self) -> Result<(), DomainError> {
        let from = self.state.read().await.sequence().next();
        let events = self.store.get_events_from(from).await?;
        if events.is_empty() {
            return Ok(());
        }

        let decoded = decode::<A::Event>(events)?;
        tracing::debug!(count = decoded.len(), %from, "catching up with log");

        let mut state = self.state.write().await;
        for (sequence, event) in decoded {
            state.apply(event);
            state.set_sequence(sequence);
        }
        Ok(())
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command and saves a snapshot when one is due.
    ///
    /// A failed snapshot write is logged and does not fail the command,
    /// whose events are already committed.
    pub async fn execute_with_snapshot<F>(
        &self,
        metadata: Metadata,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error> + Send,
        DomainError: From<A::Error>,
    {
        let _writer = self.writer.lock().await;
        let result = self.execute_locked(metadata, command_fn).await?;

        if result.events.is_empty() {
            return Ok(result);
        }

        let snapshot = {
            let state = self.state.read().await;
            let last = Sequence::new(self.last_snapshot.load(Ordering::Acquire));
            if !state.should_snapshot(self.snapshot_interval, last) {
                return Ok(result);
            }
            state.snapshot()
        };

        match snapshot {
            Ok(snapshot) => {
                let sequence = snapshot.sequence;
                match self.store.save_snapshot(snapshot).await {
                    Ok(()) => {
                        self.last_snapshot.store(sequence.as_i64(), Ordering::Release);
                        tracing::debug!(%sequence, "saved snapshot");
                    }
                    Err(e) => tracing::warn!(error = %e, %sequence, "failed to save snapshot"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize snapshot"),
        }

        Ok(result)
    }
}

/// Builds event envelopes stamped with the positions after `current`.
fn build_envelopes<E: DomainEvent>(
    current: Sequence,
    events: &[E],
    metadata: &Metadata,
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut envelopes = Vec::with_capacity(events.len());
    let mut sequence = current;

    for event in events {
        sequence = sequence.next();
        let envelope = EventEnvelope::builder(event.event_type(), sequence)
            .payload(event)?
            .metadata_from(metadata)
            .build();
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

fn decode<E: DomainEvent>(
    envelopes: Vec<EventEnvelope>,
) -> Result<Vec<(Sequence, E)>, DomainError> {
    envelopes
        .into_iter()
        .map(|envelope| Ok((envelope.sequence, envelope.decode()?)))
        .collect()
}
