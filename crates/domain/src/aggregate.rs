//! Traits shared by event-sourced state folded from the ledger log.

use event_store::{Sequence, Snapshot};
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded in the log, named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + std::fmt::Debug {
    /// Kind stored next to the payload; readers filter on it.
    fn event_type(&self) -> &'static str;
}

/// State rebuilt by folding events in sequence order.
///
/// The whole log folds into one aggregate, so its position is the global
/// [`Sequence`] of the last event it has seen. Decisions are made by the
/// aggregate's own command methods; this trait only covers folding.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    /// Rejection returned by the aggregate's command methods.
    type Error: std::error::Error + Send + Sync;

    /// Key under which snapshots of this aggregate are stored.
    fn aggregate_type() -> &'static str;

    /// Position of the last folded event, `Sequence::initial()` when empty.
    fn sequence(&self) -> Sequence;

    fn set_sequence(&mut self, sequence: Sequence);

    /// Folds one event into the state.
    ///
    /// Events are facts, so this never fails and never looks outside `self`.
    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Aggregates whose folded state can be saved and reloaded as a snapshot.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns true once at least `interval` events were folded since the
    /// snapshot taken at `last`.
    ///
    /// A command may append several events at once, so the check is on the
    /// gap rather than on exact multiples. An interval of 0 never snapshots.
    fn should_snapshot(&self, interval: u64, last: Sequence) -> bool {
        if interval == 0 {
            return false;
        }
        let gap = self.sequence().as_i64() - last.as_i64();
        gap > 0 && gap as u64 >= interval
    }

    /// Serializes the current state at its current position.
    fn snapshot(&self) -> Result<Snapshot, serde_json::Error> {
        Snapshot::from_state(Self::aggregate_type(), self.sequence(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum BinEvent {
        Dropped { weight: u64 },
        Emptied,
    }

    impl DomainEvent for BinEvent {
        fn event_type(&self) -> &'static str {
            match self {
                BinEvent::Dropped { .. } => "BinDropped",
                BinEvent::Emptied => "BinEmptied",
            }
        }
    }

    /// Tracks the weight sitting in a collection bin.
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Bin {
        weight: u64,
        drops: u32,
        sequence: Sequence,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("bin rejected the command")]
    struct BinError;

    impl Aggregate for Bin {
        type Event = BinEvent;
        type Error = BinError;

        fn aggregate_type() -> &'static str {
            "Bin"
        }

        fn sequence(&self) -> Sequence {
            self.sequence
        }

        fn set_sequence(&mut self, sequence: Sequence) {
            self.sequence = sequence;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                BinEvent::Dropped { weight } => {
                    self.weight += weight;
                    self.drops += 1;
                }
                BinEvent::Emptied => self.weight = 0,
            }
        }
    }

    impl SnapshotCapable for Bin {}

    fn at(sequence: i64) -> Bin {
        let mut bin = Bin::default();
        bin.set_sequence(Sequence::new(sequence));
        bin
    }

    #[test]
    fn test_apply_events_folds_in_order() {
        let mut bin = Bin::default();
        bin.apply_events([
            BinEvent::Dropped { weight: 3 },
            BinEvent::Emptied,
            BinEvent::Dropped { weight: 5 },
        ]);

        assert_eq!(bin.weight, 5);
        assert_eq!(bin.drops, 2);
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(BinEvent::Dropped { weight: 1 }.event_type(), "BinDropped");
        assert_eq!(BinEvent::Emptied.event_type(), "BinEmptied");
    }

    #[test]
    fn test_snapshot_due_after_interval() {
        assert!(!Bin::default().should_snapshot(10, Sequence::initial()));
        assert!(!at(9).should_snapshot(10, Sequence::initial()));
        assert!(at(10).should_snapshot(10, Sequence::initial()));
        assert!(!at(15).should_snapshot(10, Sequence::new(10)));
        assert!(at(20).should_snapshot(10, Sequence::new(10)));
    }

    #[test]
    fn test_snapshot_due_when_batch_skips_multiple() {
        // 8 -> 11 in one command never lands on 10
        assert!(at(11).should_snapshot(10, Sequence::initial()));
    }

    #[test]
    fn test_zero_interval_disables_snapshots() {
        assert!(!at(1000).should_snapshot(0, Sequence::initial()));
    }

    #[test]
    fn test_snapshot_carries_position() {
        let mut bin = at(4);
        bin.apply(BinEvent::Dropped { weight: 7 });

        let snapshot = bin.snapshot().unwrap();
        assert_eq!(snapshot.aggregate_type, "Bin");
        assert_eq!(snapshot.sequence, Sequence::new(4));

        let restored: Bin = snapshot.into_state().unwrap();
        assert_eq!(restored.weight, 7);
        assert_eq!(restored.sequence, Sequence::new(4));
    }
}
