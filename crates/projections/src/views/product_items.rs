//! Product items read model: every unit of every product with its status.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ManufacturerId, ProductId, ProductItemId};
use domain::{LedgerEvent, ProductStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_ledger_event};
use crate::read_model::ReadModel;

/// Number of a product's items in each lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub manufactured: u64,
    pub sold: u64,
    pub returned: u64,
    pub recycled: u64,
}

impl StatusCounts {
    /// Returns the count for one status.
    pub fn get(&self, status: ProductStatus) -> u64 {
        match status {
            ProductStatus::Manufactured => self.manufactured,
            ProductStatus::Sold => self.sold,
            ProductStatus::Returned => self.returned,
            ProductStatus::Recycled => self.recycled,
        }
    }

    /// Returns the total number of items.
    pub fn total(&self) -> u64 {
        self.manufactured + self.sold + self.returned + self.recycled
    }

    fn slot(&mut self, status: ProductStatus) -> &mut u64 {
        match status {
            ProductStatus::Manufactured => &mut self.manufactured,
            ProductStatus::Sold => &mut self.sold,
            ProductStatus::Returned => &mut self.returned,
            ProductStatus::Recycled => &mut self.recycled,
        }
    }
}

/// A product together with the status of each of its items.
#[derive(Debug, Clone)]
pub struct ProductItemsSummary {
    pub product_id: ProductId,
    pub name: String,
    pub manufacturer: ManufacturerId,
    pub items: BTreeMap<ProductItemId, ProductStatus>,
    pub counts: StatusCounts,
}

/// Internal state for the product items view.
#[derive(Default)]
struct ProductItemsState {
    products: BTreeMap<ProductId, ProductItemsSummary>,
    position: ProjectionPosition,
}

/// Read model view of items grouped by product, queryable by status.
#[derive(Clone, Default)]
pub struct ProductItemsView {
    state: Arc<RwLock<ProductItemsState>>,
}

impl ProductItemsView {
    /// Creates a new empty product items view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a product with its items.
    pub async fn get_product(&self, product_id: ProductId) -> Option<ProductItemsSummary> {
        self.state.read().await.products.get(&product_id).cloned()
    }

    /// Gets the ids of a product's items that are in `status`, in sequence
    /// order.
    pub async fn items_with_status(
        &self,
        product_id: ProductId,
        status: ProductStatus,
    ) -> Vec<ProductItemId> {
        let state = self.state.read().await;
        state
            .products
            .get(&product_id)
            .map(|product| {
                product
                    .items
                    .iter()
                    .filter(|(_, s)| **s == status)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Gets per-status item counts for a product.
    pub async fn status_counts(&self, product_id: ProductId) -> Option<StatusCounts> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.counts)
    }

    /// Gets item counts per status summed over every product.
    pub async fn totals(&self) -> StatusCounts {
        let state = self.state.read().await;
        state
            .products
            .values()
            .fold(StatusCounts::default(), |mut acc, p| {
                acc.manufactured += p.counts.manufactured;
                acc.sold += p.counts.sold;
                acc.returned += p.counts.returned;
                acc.recycled += p.counts.recycled;
                acc
            })
    }
}

#[async_trait]
impl Projection for ProductItemsView {
    fn name(&self) -> &'static str {
        "ProductItemsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let ledger_event = decode_ledger_event(event)?;
        let mut state = self.state.write().await;

        match ledger_event {
            Some(LedgerEvent::ProductCreated(data)) => {
                state.products.insert(
                    data.product_id,
                    ProductItemsSummary {
                        product_id: data.product_id,
                        name: data.name,
                        manufacturer: data.owner,
                        items: BTreeMap::new(),
                        counts: StatusCounts::default(),
                    },
                );
            }
            Some(LedgerEvent::ProductItemsAdded(data)) => {
                if let Some(product) = state.products.get_mut(&data.product_id) {
                    for id in data.item_ids {
                        product.items.insert(id, ProductStatus::Manufactured);
                        product.counts.manufactured += 1;
                    }
                }
            }
            Some(LedgerEvent::ProductItemsStatusChanged(data)) => {
                for id in data.item_ids {
                    if let Some(product) = state.products.get_mut(&id.product_id())
                        && let Some(status) = product.items.get_mut(&id)
                    {
                        let previous = std::mem::replace(status, data.new_status);
                        *product.counts.slot(previous) -= 1;
                        *product.counts.slot(data.new_status) += 1;
                    }
                }
            }
            Some(LedgerEvent::ManufacturerRegistered(_)) | None => {}
        }

        state.position = state.position.advance(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ProductItemsView {
    fn name(&self) -> &'static str {
        "ProductItemsView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.state
            .try_read()
            .map(|s| s.products.len())
            .unwrap_or(0)
    }
}
