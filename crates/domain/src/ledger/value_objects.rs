//! Records held by the ledger.

use chrono::{DateTime, Utc};
use common::{ManufacturerId, ProductId, ProductItemId};
use serde::{Deserialize, Serialize};

use super::ProductStatus;

/// A registered manufacturer. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub identity: ManufacturerId,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub registered_at: DateTime<Utc>,
}

/// One entry of a product's toxic-material manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToxicMaterial {
    /// Material name (e.g., "Lead").
    pub name: String,

    /// Weight of the material per unit.
    pub weight: u64,
}

impl ToxicMaterial {
    /// Creates a new manifest entry.
    pub fn new(name: impl Into<String>, weight: u64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// A catalog entry describing a manufactured good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Sequentially assigned id, starting at 1.
    pub id: ProductId,

    pub name: String,

    /// Manifest in the order it was declared.
    pub toxic_materials: Vec<ToxicMaterial>,

    /// The manufacturer that created and owns the product.
    pub manufacturer: ManufacturerId,

    /// Number of units added so far. Only ever grows.
    pub quantity: u64,

    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if `identity` owns this product.
    pub fn is_owned_by(&self, identity: &ManufacturerId) -> bool {
        &self.manufacturer == identity
    }

    /// Returns the ids the next `count` units would receive.
    pub fn next_item_ids(&self, count: u64) -> Vec<ProductItemId> {
        (self.quantity + 1..=self.quantity + count)
            .map(|sequence| ProductItemId::new(self.id, sequence))
            .collect()
    }
}

/// One physical, individually tracked unit of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: ProductItemId,
    pub status: ProductStatus,
}

impl ProductItem {
    /// Creates a freshly manufactured item.
    pub fn manufactured(id: ProductItemId) -> Self {
        Self {
            id,
            status: ProductStatus::Manufactured,
        }
    }

    /// Returns the product this item is a unit of.
    pub fn product_id(&self) -> ProductId {
        self.id.product_id()
    }
}
