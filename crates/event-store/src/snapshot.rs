//! Folded aggregate state stored beside the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Sequence;

/// Aggregate state folded up to and including `sequence`.
///
/// At most one snapshot is kept per aggregate type, and it never moves
/// backwards: a snapshot only replaces one it [`supersedes`](Self::supersedes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate the state belongs to (e.g., "RecycleLedger").
    pub aggregate_type: String,

    /// The last sequence folded into `state`.
    pub sequence: Sequence,

    pub timestamp: DateTime<Utc>,

    /// The serialized aggregate state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a snapshot taken now.
    pub fn new(
        aggregate_type: impl Into<String>,
        sequence: Sequence,
        state: serde_json::Value,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            sequence,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Serializes `state` into a snapshot.
    pub fn from_state<T: Serialize>(
        aggregate_type: impl Into<String>,
        sequence: Sequence,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(aggregate_type, sequence, serde_json::to_value(state)?))
    }

    /// Deserializes the folded state.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }

    /// First sequence a reader must replay on top of this snapshot.
    pub fn replay_from(&self) -> Sequence {
        self.sequence.next()
    }

    /// Returns true if this snapshot covers more of the log than `other`.
    pub fn supersedes(&self, other: &Snapshot) -> bool {
        self.sequence > other.sequence
    }
}
