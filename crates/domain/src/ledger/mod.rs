//! Recycle ledger aggregate and related types.

mod aggregate;
mod catalog;
mod commands;
mod config;
mod events;
mod items;
mod registry;
mod service;
mod state;
mod value_objects;

pub use aggregate::{Ledger, MAX_ITEMS_PER_BATCH};
pub use catalog::ProductCatalog;
pub use commands::*;
pub use config::{LedgerConfig, TransitionPolicy, UnknownTransitionPolicy};
pub use events::{
    LedgerEvent, ManufacturerRegisteredData, ProductCreatedData, ProductItemsAddedData,
    ProductItemsStatusChangedData,
};
pub use items::ProductItemLedger;
pub use registry::IdentityRegistry;
pub use service::LedgerService;
pub use state::{ProductStatus, Transition, UnknownStatusCode};
pub use value_objects::{Manufacturer, Product, ProductItem, ToxicMaterial};

use common::{ManufacturerId, ProductId, ProductItemId};
use thiserror::Error;

/// Reasons the ledger rejects a command.
///
/// Every rejection is detected before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The identity already has a manufacturer profile.
    #[error("Manufacturer already registered")]
    AlreadyRegistered { identity: ManufacturerId },

    /// The identity has no manufacturer profile.
    #[error("Manufacturer not registered")]
    NotRegistered { identity: ManufacturerId },

    /// Toxic material names and weights differ in length.
    #[error("Toxic items array length mismatch")]
    LengthMismatch { names: usize, weights: usize },

    /// No product has this id.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// No item has this id, or the id is malformed.
    #[error("Product item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// The identity does not own the product.
    #[error("Only the product manufacturer can {action} product items.")]
    NotOwner {
        product_id: ProductId,
        identity: ManufacturerId,
        action: &'static str,
    },

    /// Item batch size outside 1 to 10.
    #[error("{}", count_out_of_range(.count))]
    CountOutOfRange { count: u64 },

    /// The item is not in the status the move starts from.
    #[error("Product Item cannot be {action}.")]
    InvalidTransition {
        item_id: ProductItemId,
        current: ProductStatus,
        action: &'static str,
    },

    /// A status change was requested for no items.
    #[error("No product items to be {action}.")]
    EmptyBatch { action: &'static str },
}

fn count_out_of_range(count: &u64) -> &'static str {
    if *count == 0 {
        "Must add at least one product item."
    } else {
        "Cannot add more than 10 product items at a time."
    }
}

impl LedgerError {
    /// Short machine-readable name of the failed precondition.
    pub fn reason(&self) -> &'static str {
        match self {
            LedgerError::AlreadyRegistered { .. } => "already_registered",
            LedgerError::NotRegistered { .. } => "not_registered",
            LedgerError::LengthMismatch { .. } => "length_mismatch",
            LedgerError::ProductNotFound { .. } | LedgerError::ItemNotFound { .. } => "not_found",
            LedgerError::NotOwner { .. } => "not_owner",
            LedgerError::CountOutOfRange { .. } => "count_out_of_range",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
            LedgerError::EmptyBatch { .. } => "empty_batch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let identity = ManufacturerId::new("M1");
        assert_eq!(
            LedgerError::AlreadyRegistered {
                identity: identity.clone()
            }
            .to_string(),
            "Manufacturer already registered"
        );
        assert_eq!(
            LedgerError::NotOwner {
                product_id: ProductId::new(1),
                identity,
                action: "add",
            }
            .to_string(),
            "Only the product manufacturer can add product items."
        );
        assert_eq!(
            LedgerError::CountOutOfRange { count: 11 }.to_string(),
            "Cannot add more than 10 product items at a time."
        );
        assert_eq!(
            LedgerError::CountOutOfRange { count: 0 }.to_string(),
            "Must add at least one product item."
        );
        assert_eq!(
            LedgerError::InvalidTransition {
                item_id: ProductItemId::new(ProductId::new(1), 1),
                current: ProductStatus::Sold,
                action: "sold",
            }
            .to_string(),
            "Product Item cannot be sold."
        );
    }

    #[test]
    fn test_reasons() {
        assert_eq!(
            LedgerError::ItemNotFound {
                item_id: "x".to_string()
            }
            .reason(),
            "not_found"
        );
        assert_eq!(
            LedgerError::LengthMismatch {
                names: 1,
                weights: 0
            }
            .reason(),
            "length_mismatch"
        );
    }
}
