//! Append-only event log.
//!
//! Every accepted ledger operation is stored as one [`EventEnvelope`] stamped
//! with a global [`Sequence`]. Stores enforce that the log is only ever
//! extended at its tail, which gives writers optimistic concurrency control
//! over the whole ledger.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;

pub use error::{EventStoreError, Result};
pub use event::{ACTOR_KEY, EventEnvelope, EventEnvelopeBuilder, EventId, Metadata, Sequence};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
