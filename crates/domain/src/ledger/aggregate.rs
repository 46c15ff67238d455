//! Ledger aggregate implementation.

use std::collections::HashSet;

use common::{ManufacturerId, ProductId, ProductItemId};
use event_store::Sequence;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    IdentityRegistry, LedgerError, LedgerEvent, Manufacturer, Product, ProductCatalog,
    ProductItem, ProductItemLedger, Transition, TransitionPolicy,
    events::{ManufacturerRegisteredData, ProductCreatedData, ProductItemsAddedData},
};

/// Largest number of units one `add_product_items` call may create.
pub const MAX_ITEMS_PER_BATCH: u64 = 10;

/// Ledger aggregate root.
///
/// Holds the whole recycle ledger: registered manufacturers, the product
/// catalog and every product unit. Command methods validate all
/// preconditions against the current state and return the single event that
/// records the outcome; they never mutate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Position of the last applied event.
    #[serde(default)]
    sequence: Sequence,

    registry: IdentityRegistry,
    catalog: ProductCatalog,
    items: ProductItemLedger,
}

impl Aggregate for Ledger {
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn aggregate_type() -> &'static str {
        "RecycleLedger"
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            LedgerEvent::ManufacturerRegistered(data) => self.apply_manufacturer_registered(data),
            LedgerEvent::ProductCreated(data) => self.apply_product_created(data),
            LedgerEvent::ProductItemsAdded(data) => self.apply_product_items_added(data),
            LedgerEvent::ProductItemsStatusChanged(data) => {
                self.items.set_status(&data.item_ids, data.new_status);
            }
        }
    }
}

impl SnapshotCapable for Ledger {}

// Query methods
impl Ledger {
    /// Returns the manufacturer registry.
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Returns the product catalog.
    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Returns the product item ledger.
    pub fn items(&self) -> &ProductItemLedger {
        &self.items
    }

    /// Returns true if `identity` has registered.
    pub fn is_registered(&self, identity: &ManufacturerId) -> bool {
        self.registry.is_registered(identity)
    }

    /// Returns the manufacturer registered for `identity`.
    pub fn manufacturer(&self, identity: &ManufacturerId) -> Result<&Manufacturer, LedgerError> {
        self.registry.require(identity)
    }

    /// Returns the product with `id`.
    pub fn product(&self, id: ProductId) -> Result<&Product, LedgerError> {
        self.catalog.require(id)
    }

    /// Returns the item with the raw id `item_id`.
    pub fn product_item(&self, item_id: &str) -> Result<&ProductItem, LedgerError> {
        self.items.resolve(item_id)
    }

    /// Returns the items of a product in sequence order.
    pub fn product_items(&self, id: ProductId) -> Result<Vec<&ProductItem>, LedgerError> {
        self.catalog.require(id)?;
        Ok(self.items.for_product(id).collect())
    }
}

// Command methods (return events)
impl Ledger {
    /// Registers a manufacturer profile for `identity`.
    pub fn register(
        &self,
        identity: &ManufacturerId,
        name: &str,
        location: &str,
        contact: &str,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.registry.ensure_unregistered(identity)?;

        Ok(vec![LedgerEvent::manufacturer_registered(
            identity.clone(),
            name,
            location,
            contact,
        )])
    }

    /// Creates a product owned by `identity` under the next product id.
    ///
    /// Registration is checked before the manifest arrays.
    pub fn create_product(
        &self,
        identity: &ManufacturerId,
        name: &str,
        toxic_names: &[String],
        toxic_weights: &[u64],
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.registry.require(identity)?;
        let manifest = ProductCatalog::manifest(toxic_names, toxic_weights)?;

        Ok(vec![LedgerEvent::product_created(
            self.catalog.next_id(),
            name,
            identity.clone(),
            manifest,
        )])
    }

    /// Adds `count` units to a product, continuing its item sequence.
    pub fn add_product_items(
        &self,
        product_id: ProductId,
        identity: &ManufacturerId,
        count: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let product = self.catalog.require(product_id)?;

        if !product.is_owned_by(identity) {
            return Err(LedgerError::NotOwner {
                product_id,
                identity: identity.clone(),
                action: "add",
            });
        }

        if !(1..=MAX_ITEMS_PER_BATCH).contains(&count) {
            return Err(LedgerError::CountOutOfRange { count });
        }

        Ok(vec![LedgerEvent::product_items_added(
            product_id,
            product.next_item_ids(count),
        )])
    }

    /// Moves every listed item through `transition`, or none of them.
    ///
    /// Ids are checked in the order given: existence, then ownership when
    /// `policy` requires it, then status. The first failing id is reported.
    /// An id listed twice fails on its second occurrence, as the item has
    /// already moved by then.
    pub fn change_status(
        &self,
        actor: &ManufacturerId,
        item_ids: &[String],
        transition: Transition,
        policy: TransitionPolicy,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        if item_ids.is_empty() {
            return Err(LedgerError::EmptyBatch {
                action: transition.past_participle(),
            });
        }

        let mut moved: HashSet<ProductItemId> = HashSet::with_capacity(item_ids.len());
        let mut ids = Vec::with_capacity(item_ids.len());

        for raw in item_ids {
            let item = self.items.resolve(raw)?;

            if policy.requires_owner() {
                let product = self.catalog.require(item.product_id())?;
                if !product.is_owned_by(actor) {
                    return Err(LedgerError::NotOwner {
                        product_id: product.id,
                        identity: actor.clone(),
                        action: transition.as_str(),
                    });
                }
            }

            let current = if moved.contains(&item.id) {
                transition.target()
            } else {
                item.status
            };
            if !transition.allows(current) {
                return Err(LedgerError::InvalidTransition {
                    item_id: item.id,
                    current,
                    action: transition.past_participle(),
                });
            }

            moved.insert(item.id);
            ids.push(item.id);
        }

        Ok(vec![LedgerEvent::product_items_status_changed(
            ids,
            transition.target(),
        )])
    }

    /// Manufactured → Sold.
    pub fn sell_product_items(
        &self,
        actor: &ManufacturerId,
        item_ids: &[String],
        policy: TransitionPolicy,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.change_status(actor, item_ids, Transition::Sell, policy)
    }

    /// Sold → Returned.
    pub fn return_product_items(
        &self,
        actor: &ManufacturerId,
        item_ids: &[String],
        policy: TransitionPolicy,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.change_status(actor, item_ids, Transition::Return, policy)
    }

    /// Returned → Recycled.
    pub fn recycle_product_items(
        &self,
        actor: &ManufacturerId,
        item_ids: &[String],
        policy: TransitionPolicy,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.change_status(actor, item_ids, Transition::Recycle, policy)
    }

    /// Moves a batch one step forward from the status of its first item.
    ///
    /// Items in any other status fail the batch as an invalid transition, as
    /// does a batch of recycled items.
    pub fn advance_product_items(
        &self,
        actor: &ManufacturerId,
        item_ids: &[String],
        policy: TransitionPolicy,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let Some(first) = item_ids.first() else {
            return Err(LedgerError::EmptyBatch { action: "advanced" });
        };

        let item = self.items.resolve(first)?;
        let Some(transition) = Transition::from_status(item.status) else {
            return Err(LedgerError::InvalidTransition {
                item_id: item.id,
                current: item.status,
                action: "advanced",
            });
        };

        self.change_status(actor, item_ids, transition, policy)
    }
}

// Event application
impl Ledger {
    fn apply_manufacturer_registered(&mut self, data: ManufacturerRegisteredData) {
        self.registry.insert(Manufacturer {
            identity: data.identity,
            name: data.name,
            location: data.location,
            contact: data.contact,
            registered_at: data.registered_at,
        });
    }

    fn apply_product_created(&mut self, data: ProductCreatedData) {
        self.catalog.insert(Product {
            id: data.product_id,
            name: data.name,
            toxic_materials: data.toxic_materials,
            manufacturer: data.owner,
            quantity: 0,
            created_at: data.created_at,
        });
    }

    fn apply_product_items_added(&mut self, data: ProductItemsAddedData) {
        self.items.insert_manufactured(&data.item_ids);
        self.catalog
            .record_items_added(data.product_id, data.item_ids.len() as u64);
    }
}
