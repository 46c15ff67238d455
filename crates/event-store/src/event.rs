use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Random identifier given to every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an id read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event in the global log.
///
/// Sequence 0 denotes the empty log; the first accepted event is stamped 1
/// and every later event is stamped exactly one higher than its predecessor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sequence(i64);

impl Sequence {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Position of the empty log.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Position of the first accepted event.
    pub fn first() -> Self {
        Self(1)
    }

    /// Following position; saturates at `i64::MAX`, which no log reaches.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Sequence {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Sequence> for i64 {
    fn from(sequence: Sequence) -> Self {
        sequence.0
    }
}

/// Metadata key holding the identity that issued the command.
pub const ACTOR_KEY: &str = "actor";

/// Free-form metadata stored next to every event.
pub type Metadata = HashMap<String, serde_json::Value>;

/// An accepted event as the log stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Kind of the event (e.g., "ProductCreated").
    pub event_type: String,

    pub sequence: Sequence,

    /// When the event was accepted.
    pub timestamp: DateTime<Utc>,

    pub payload: serde_json::Value,

    /// Acting identity under [`ACTOR_KEY`], plus whatever else the writer
    /// attached.
    pub metadata: Metadata,
}

impl EventEnvelope {
    /// Starts an envelope of kind `event_type` at log position `sequence`.
    pub fn builder(event_type: impl Into<String>, sequence: Sequence) -> EventEnvelopeBuilder {
        EventEnvelopeBuilder {
            event_id: None,
            event_type: event_type.into(),
            sequence,
            timestamp: None,
            payload: serde_json::Value::Null,
            metadata: Metadata::new(),
        }
    }

    /// Returns the identity recorded under [`ACTOR_KEY`], if any.
    pub fn actor(&self) -> Option<&str> {
        self.metadata.get(ACTOR_KEY).and_then(serde_json::Value::as_str)
    }

    /// Deserializes the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

#[derive(Debug)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: String,
    sequence: Sequence,
    timestamp: Option<DateTime<Utc>>,
    payload: serde_json::Value,
    metadata: Metadata,
}

impl EventEnvelopeBuilder {
    /// Fixes the event id; a random one is generated otherwise.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Fixes the timestamp; defaults to now.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = serde_json::to_value(payload)?;
        Ok(self)
    }

    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Copies every entry of `metadata` onto the envelope.
    pub fn metadata_from(mut self, metadata: &Metadata) -> Self {
        self.metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn build(self) -> EventEnvelope {
        EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type,
            sequence: self.sequence,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload,
            metadata: self.metadata,
        }
    }
}
