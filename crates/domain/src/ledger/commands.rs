//! Ledger commands.

use common::{ManufacturerId, ProductId};

use crate::command::Command;

use super::{Ledger, Transition};

/// Command to register a manufacturer profile for an identity.
#[derive(Debug, Clone)]
pub struct RegisterManufacturer {
    pub identity: ManufacturerId,
    pub name: String,
    pub location: String,
    pub contact: String,
}

impl RegisterManufacturer {
    /// Creates a new RegisterManufacturer command.
    pub fn new(
        identity: impl Into<ManufacturerId>,
        name: impl Into<String>,
        location: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            location: location.into(),
            contact: contact.into(),
        }
    }
}

impl Command for RegisterManufacturer {
    type Aggregate = Ledger;

    fn name(&self) -> &'static str {
        "register_manufacturer"
    }

    fn actor(&self) -> &ManufacturerId {
        &self.identity
    }
}

/// Command to create a product with its toxic-material manifest.
///
/// The manifest is given as parallel name and weight arrays, which must have
/// the same length.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub identity: ManufacturerId,
    pub name: String,
    pub toxic_names: Vec<String>,
    pub toxic_weights: Vec<u64>,
}

impl CreateProduct {
    /// Creates a new CreateProduct command.
    pub fn new(
        identity: impl Into<ManufacturerId>,
        name: impl Into<String>,
        toxic_names: Vec<String>,
        toxic_weights: Vec<u64>,
    ) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            toxic_names,
            toxic_weights,
        }
    }

    /// Creates a CreateProduct command from `(name, weight)` pairs.
    pub fn with_materials<'a>(
        identity: impl Into<ManufacturerId>,
        name: impl Into<String>,
        materials: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Self {
        let (toxic_names, toxic_weights) = materials
            .into_iter()
            .map(|(name, weight)| (name.to_string(), weight))
            .unzip();
        Self::new(identity, name, toxic_names, toxic_weights)
    }
}

impl Command for CreateProduct {
    type Aggregate = Ledger;

    fn name(&self) -> &'static str {
        "create_product"
    }

    fn actor(&self) -> &ManufacturerId {
        &self.identity
    }
}

/// Command to add `count` new units to a product.
#[derive(Debug, Clone)]
pub struct AddProductItems {
    pub product_id: ProductId,
    pub identity: ManufacturerId,
    pub count: u64,
}

impl AddProductItems {
    /// Creates a new AddProductItems command.
    pub fn new(
        product_id: impl Into<ProductId>,
        identity: impl Into<ManufacturerId>,
        count: u64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            identity: identity.into(),
            count,
        }
    }
}

impl Command for AddProductItems {
    type Aggregate = Ledger;

    fn name(&self) -> &'static str {
        "add_product_items"
    }

    fn actor(&self) -> &ManufacturerId {
        &self.identity
    }
}

/// Command to move a batch of items one step along their lifecycle.
///
/// Item ids are taken as given by the caller; ids that are malformed or
/// unknown make the batch fail as not found.
#[derive(Debug, Clone)]
pub struct ChangeItemStatus {
    pub actor: ManufacturerId,
    pub item_ids: Vec<String>,
    pub transition: Transition,
}

impl ChangeItemStatus {
    /// Creates a new ChangeItemStatus command.
    pub fn new<I, T>(actor: impl Into<ManufacturerId>, item_ids: I, transition: Transition) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            actor: actor.into(),
            item_ids: item_ids.into_iter().map(|id| id.to_string()).collect(),
            transition,
        }
    }

    /// Manufactured → Sold.
    pub fn sell<I, T>(actor: impl Into<ManufacturerId>, item_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::new(actor, item_ids, Transition::Sell)
    }

    /// Sold → Returned.
    pub fn return_items<I, T>(actor: impl Into<ManufacturerId>, item_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::new(actor, item_ids, Transition::Return)
    }

    /// Returned → Recycled.
    pub fn recycle<I, T>(actor: impl Into<ManufacturerId>, item_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::new(actor, item_ids, Transition::Recycle)
    }
}

impl Command for ChangeItemStatus {
    type Aggregate = Ledger;

    fn name(&self) -> &'static str {
        match self.transition {
            Transition::Sell => "sell_product_items",
            Transition::Return => "return_product_items",
            Transition::Recycle => "recycle_product_items",
        }
    }

    fn actor(&self) -> &ManufacturerId {
        &self.actor
    }
}

/// Command to move a batch of items to whatever status follows their
/// current one. Every item in the batch must share that status.
#[derive(Debug, Clone)]
pub struct AdvanceProductItems {
    pub actor: ManufacturerId,
    pub item_ids: Vec<String>,
}

impl AdvanceProductItems {
    /// Creates a new AdvanceProductItems command.
    pub fn new<I, T>(actor: impl Into<ManufacturerId>, item_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            actor: actor.into(),
            item_ids: item_ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl Command for AdvanceProductItems {
    type Aggregate = Ledger;

    fn name(&self) -> &'static str {
        "advance_product_items"
    }

    fn actor(&self) -> &ManufacturerId {
        &self.actor
    }
}
