//! Manufacturer products read model: each manufacturer with the products
//! it created and how many of their units came back for recycling.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ManufacturerId, ProductId};
use domain::{LedgerEvent, ProductStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_ledger_event};
use crate::read_model::ReadModel;

/// Summary of one product in a manufacturer's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub recycled: u64,

    /// Declared toxic weight of a single unit.
    pub toxic_weight_per_unit: u64,
}

impl ProductSummary {
    /// Toxic weight of all units that reached recycling.
    pub fn recycled_toxic_weight(&self) -> u64 {
        self.recycled * self.toxic_weight_per_unit
    }
}

/// A manufacturer with its products.
#[derive(Debug, Clone)]
pub struct ManufacturerSummary {
    pub identity: ManufacturerId,
    pub name: String,
    pub location: String,
    pub registered_at: DateTime<Utc>,
    pub products: BTreeMap<ProductId, ProductSummary>,
}

impl ManufacturerSummary {
    /// Total units across every product.
    pub fn total_items(&self) -> u64 {
        self.products.values().map(|p| p.quantity).sum()
    }

    /// Total recycled units across every product.
    pub fn total_recycled(&self) -> u64 {
        self.products.values().map(|p| p.recycled).sum()
    }
}

/// Internal state for the manufacturer products view.
#[derive(Default)]
struct ManufacturerProductsState {
    manufacturers: HashMap<ManufacturerId, ManufacturerSummary>,
    /// Owner of each product, for routing item events.
    owners: HashMap<ProductId, ManufacturerId>,
    position: ProjectionPosition,
}

impl ManufacturerProductsState {
    fn product_mut(&mut self, product_id: ProductId) -> Option<&mut ProductSummary> {
        let owner = self.owners.get(&product_id)?;
        self.manufacturers
            .get_mut(owner)?
            .products
            .get_mut(&product_id)
    }
}

/// Read model view of products grouped by manufacturer.
#[derive(Clone, Default)]
pub struct ManufacturerProductsView {
    state: Arc<RwLock<ManufacturerProductsState>>,
}

impl ManufacturerProductsView {
    /// Creates a new empty manufacturer products view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a manufacturer with its products.
    pub async fn get_manufacturer(&self, identity: &ManufacturerId) -> Option<ManufacturerSummary> {
        self.state.read().await.manufacturers.get(identity).cloned()
    }

    /// Gets the products of a manufacturer in id order.
    pub async fn products_of(&self, identity: &ManufacturerId) -> Vec<ProductSummary> {
        self.state
            .read()
            .await
            .manufacturers
            .get(identity)
            .map(|m| m.products.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Gets manufacturers ordered by recycled units, most first.
    pub async fn top_recyclers(&self, limit: usize) -> Vec<ManufacturerSummary> {
        let state = self.state.read().await;
        let mut manufacturers: Vec<_> = state.manufacturers.values().cloned().collect();
        manufacturers.sort_by(|a, b| {
            b.total_recycled()
                .cmp(&a.total_recycled())
                .then_with(|| a.identity.cmp(&b.identity))
        });
        manufacturers.truncate(limit);
        manufacturers
    }
}

#[async_trait]
impl Projection for ManufacturerProductsView {
    fn name(&self) -> &'static str {
        "ManufacturerProductsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let ledger_event = decode_ledger_event(event)?;
        let mut state = self.state.write().await;

        match ledger_event {
            Some(LedgerEvent::ManufacturerRegistered(data)) => {
                state
                    .manufacturers
                    .entry(data.identity.clone())
                    .or_insert(ManufacturerSummary {
                        identity: data.identity,
                        name: data.name,
                        location: data.location,
                        registered_at: data.registered_at,
                        products: BTreeMap::new(),
                    });
            }
            Some(LedgerEvent::ProductCreated(data)) => {
                let summary = ProductSummary {
                    product_id: data.product_id,
                    name: data.name,
                    quantity: 0,
                    recycled: 0,
                    toxic_weight_per_unit: data.toxic_materials.iter().map(|m| m.weight).sum(),
                };
                if let Some(manufacturer) = state.manufacturers.get_mut(&data.owner) {
                    manufacturer.products.insert(data.product_id, summary);
                }
                state.owners.insert(data.product_id, data.owner);
            }
            Some(LedgerEvent::ProductItemsAdded(data)) => {
                if let Some(product) = state.product_mut(data.product_id) {
                    product.quantity += data.item_ids.len() as u64;
                }
            }
            Some(LedgerEvent::ProductItemsStatusChanged(data))
                if data.new_status == ProductStatus::Recycled =>
            {
                for id in &data.item_ids {
                    if let Some(product) = state.product_mut(id.product_id()) {
                        product.recycled += 1;
                    }
                }
            }
            Some(LedgerEvent::ProductItemsStatusChanged(_)) | None => {}
        }

        state.position = state.position.advance(event.sequence);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.manufacturers.clear();
        state.owners.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ManufacturerProductsView {
    fn name(&self) -> &'static str {
        "ManufacturerProductsView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.state
            .try_read()
            .map(|s| s.manufacturers.len())
            .unwrap_or(0)
    }
}
