//! Status history read model: the lifecycle of each item, step by step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ProductItemId;
use domain::{LedgerEvent, ProductStatus};
use event_store::{EventEnvelope, Sequence};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_ledger_event};
use crate::read_model::ReadModel;

/// One step in an item's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ProductStatus,

    /// Log position of the event that made the change.
    pub sequence: Sequence,

    pub changed_at: DateTime<Utc>,

    /// Identity that issued the change, when recorded.
    pub actor: Option<String>,
}

/// Internal state for the status history view.
#[derive(Default)]
struct StatusHistoryState {
    history: HashMap<ProductItemId, Vec<StatusChange>>,
    position: ProjectionPosition,
}

/// Read model view of per-item status history.
///
/// The first entry of every item is `Manufactured`, recorded when the item
/// was added; each later entry is one accepted transition.
#[derive(Clone, Default)]
pub struct StatusHistoryView {
    state: Arc<RwLock<StatusHistoryState>>,
}

impl StatusHistoryView {
    /// Creates a new empty status history view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the history of an item, oldest first.
    pub async fn history_of(&self, item_id: ProductItemId) -> Vec<StatusChange> {
        self.state
            .read()
            .await
            .history
            .get(&item_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets the latest status of an item.
    pub async fn current_status(&self, item_id: ProductItemId) -> Option<ProductStatus> {
        self.state
            .read()
            .await
            .history
            .get(&item_id)
            .and_then(|changes| changes.last())
            .map(|change| change.status)
    }

    /// Gets the items whose latest change happened after `sequence`.
    pub async fn changed_since(&self, sequence: Sequence) -> Vec<ProductItemId> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .history
            .iter()
            .filter(|(_, changes)| changes.last().is_some_and(|c| c.sequence > sequence))
            .map(|(id, _)| *id)
            .collect();
        items.sort();
        items
    }
}

#[async_trait]
impl Projection for StatusHistoryView {
    fn name(&self) -> &'static str {
        "StatusHistoryView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let ledger_event = decode_ledger_event(event)?;
        let actor = event.actor().map(str::to_string);

        let change = |status| StatusChange {
            status,
            sequence: event.sequence,
            changed_at: event.timestamp,
            actor: actor.clone(),
        };

        let mut state = self.state.write().await;

        match ledger_event {
            Some(LedgerEvent::ProductItemsAdded(data)) => {
                for id in data.item_ids {
                    state
                        .history
                        .insert(id, vec![change(ProductStatus::Manufactured)]);
                }
            }
            Some(LedgerEvent::ProductItemsStatusChanged(data)) => {
                for id in data.item_ids {
                    state
                        .history
                        .entry(id)
                        .or_default()
                        .push(change(data.new_status));
                }
            }
            Some(LedgerEvent::ManufacturerRegistered(_) | LedgerEvent::ProductCreated(_))
            | None => {}
        }

        state.position = state.position.advance(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.history.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for StatusHistoryView {
    fn name(&self) -> &'static str {
        "StatusHistoryView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.state
            .try_read()
            .map(|s| s.history.len())
            .unwrap_or(0)
    }
}
