//! Ledger domain events.

use chrono::{DateTime, Utc};
use common::{ManufacturerId, ProductId, ProductItemId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{ProductStatus, ToxicMaterial};

/// Facts recorded by the ledger, one per accepted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    /// A manufacturer registered its identity.
    ManufacturerRegistered(ManufacturerRegisteredData),

    /// A manufacturer created a product.
    ProductCreated(ProductCreatedData),

    /// Units were added to a product.
    ProductItemsAdded(ProductItemsAddedData),

    /// A batch of units moved to a new lifecycle status.
    ProductItemsStatusChanged(ProductItemsStatusChangedData),
}

impl LedgerEvent {
    pub const MANUFACTURER_REGISTERED: &'static str = "ManufacturerRegistered";
    pub const PRODUCT_CREATED: &'static str = "ProductCreated";
    pub const PRODUCT_ITEMS_ADDED: &'static str = "ProductItemsAdded";
    pub const PRODUCT_ITEMS_STATUS_CHANGED: &'static str = "ProductItemsStatusChanged";

    /// Every event kind the ledger emits.
    pub const KINDS: [&'static str; 4] = [
        Self::MANUFACTURER_REGISTERED,
        Self::PRODUCT_CREATED,
        Self::PRODUCT_ITEMS_ADDED,
        Self::PRODUCT_ITEMS_STATUS_CHANGED,
    ];
}

impl DomainEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::ManufacturerRegistered(_) => Self::MANUFACTURER_REGISTERED,
            LedgerEvent::ProductCreated(_) => Self::PRODUCT_CREATED,
            LedgerEvent::ProductItemsAdded(_) => Self::PRODUCT_ITEMS_ADDED,
            LedgerEvent::ProductItemsStatusChanged(_) => Self::PRODUCT_ITEMS_STATUS_CHANGED,
        }
    }
}

/// Data for ManufacturerRegistered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerRegisteredData {
    pub identity: ManufacturerId,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub registered_at: DateTime<Utc>,
}

/// Data for ProductCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreatedData {
    /// The id assigned to the new product.
    pub product_id: ProductId,

    pub name: String,

    /// The creating manufacturer.
    pub owner: ManufacturerId,

    /// Declared manifest, needed to rebuild the catalog from the log.
    pub toxic_materials: Vec<ToxicMaterial>,

    pub created_at: DateTime<Utc>,
}

/// Data for ProductItemsAdded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItemsAddedData {
    /// New item ids, contiguous and in sequence order.
    pub item_ids: Vec<ProductItemId>,

    pub product_id: ProductId,
}

/// Data for ProductItemsStatusChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItemsStatusChangedData {
    /// The items that moved, in the order they were requested.
    pub item_ids: Vec<ProductItemId>,

    pub new_status: ProductStatus,
}

impl LedgerEvent {
    /// Returns the status items moved to, for status changes.
    pub fn new_status(&self) -> Option<ProductStatus> {
        match self {
            LedgerEvent::ProductItemsStatusChanged(data) => Some(data.new_status),
            _ => None,
        }
    }

    /// Returns the item ids the event touches.
    pub fn item_ids(&self) -> &[ProductItemId] {
        match self {
            LedgerEvent::ProductItemsAdded(data) => &data.item_ids,
            LedgerEvent::ProductItemsStatusChanged(data) => &data.item_ids,
            _ => &[],
        }
    }

    /// Returns the product the event is about, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            LedgerEvent::ProductCreated(data) => Some(data.product_id),
            LedgerEvent::ProductItemsAdded(data) => Some(data.product_id),
            _ => None,
        }
    }
}

// Convenience constructors for events
impl LedgerEvent {
    /// Creates a ManufacturerRegistered event.
    pub fn manufacturer_registered(
        identity: ManufacturerId,
        name: impl Into<String>,
        location: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        LedgerEvent::ManufacturerRegistered(ManufacturerRegisteredData {
            identity,
            name: name.into(),
            location: location.into(),
            contact: contact.into(),
            registered_at: Utc::now(),
        })
    }

    /// Creates a ProductCreated event.
    pub fn product_created(
        product_id: ProductId,
        name: impl Into<String>,
        owner: ManufacturerId,
        toxic_materials: Vec<ToxicMaterial>,
    ) -> Self {
        LedgerEvent::ProductCreated(ProductCreatedData {
            product_id,
            name: name.into(),
            owner,
            toxic_materials,
            created_at: Utc::now(),
        })
    }

    /// Creates a ProductItemsAdded event.
    pub fn product_items_added(product_id: ProductId, item_ids: Vec<ProductItemId>) -> Self {
        LedgerEvent::ProductItemsAdded(ProductItemsAddedData {
            item_ids,
            product_id,
        })
    }

    /// Creates a ProductItemsStatusChanged event.
    pub fn product_items_status_changed(
        item_ids: Vec<ProductItemId>,
        new_status: ProductStatus,
    ) -> Self {
        LedgerEvent::ProductItemsStatusChanged(ProductItemsStatusChangedData {
            item_ids,
            new_status,
        })
    }
}
