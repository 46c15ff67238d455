//! Product item ledger.

use std::collections::BTreeMap;

use common::{ProductId, ProductItemId};
use serde::{Deserialize, Serialize};

use super::{LedgerError, ProductItem, ProductStatus};

/// Owns every product unit and its lifecycle status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductItemLedger {
    items: BTreeMap<ProductItemId, ProductItem>,
}

impl ProductItemLedger {
    /// Returns the item with `id`.
    pub fn get(&self, id: &ProductItemId) -> Option<&ProductItem> {
        self.items.get(id)
    }

    /// Resolves a raw `"{product}-{sequence}"` id to a known item.
    ///
    /// Malformed ids are reported as not found.
    pub fn resolve(&self, raw: &str) -> Result<&ProductItem, LedgerError> {
        raw.parse::<ProductItemId>()
            .ok()
            .and_then(|id| self.items.get(&id))
            .ok_or_else(|| LedgerError::ItemNotFound {
                item_id: raw.to_string(),
            })
    }

    /// Returns the number of items across all products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items exist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the items of `product_id` in sequence order.
    pub fn for_product(&self, product_id: ProductId) -> impl Iterator<Item = &ProductItem> {
        let start = ProductItemId::new(product_id, 0);
        let end = ProductItemId::new(product_id, u64::MAX);
        self.items.range(start..=end).map(|(_, item)| item)
    }

    /// Counts the items in each status.
    pub fn status_counts(&self) -> BTreeMap<ProductStatus, usize> {
        let mut counts = BTreeMap::new();
        for item in self.items.values() {
            *counts.entry(item.status).or_insert(0) += 1;
        }
        counts
    }

    pub(super) fn insert_manufactured(&mut self, ids: &[ProductItemId]) {
        for id in ids {
            self.items
                .entry(*id)
                .or_insert_with(|| ProductItem::manufactured(*id));
        }
    }

    pub(super) fn set_status(&mut self, ids: &[ProductItemId], status: ProductStatus) {
        for id in ids {
            if let Some(item) = self.items.get_mut(id) {
                item.status = status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(product: u64, sequence: u64) -> ProductItemId {
        ProductItemId::new(ProductId::new(product), sequence)
    }

    fn ledger() -> ProductItemLedger {
        let mut ledger = ProductItemLedger::default();
        ledger.insert_manufactured(&[id(1, 1), id(1, 2), id(2, 1), id(1, 3)]);
        ledger
    }

    #[test]
    fn test_inserted_items_are_manufactured() {
        let ledger = ledger();
        assert_eq!(ledger.len(), 4);
        assert_eq!(
            ledger.get(&id(2, 1)).unwrap().status,
            ProductStatus::Manufactured
        );
    }

    #[test]
    fn test_for_product_returns_items_in_sequence_order() {
        let ledger = ledger();
        let ids: Vec<String> = ledger
            .for_product(ProductId::new(1))
            .map(|item| item.id.to_string())
            .collect();
        assert_eq!(ids, vec!["1-1", "1-2", "1-3"]);
        assert_eq!(ledger.for_product(ProductId::new(3)).count(), 0);
    }

    #[test]
    fn test_resolve_reports_unknown_and_malformed_ids() {
        let ledger = ledger();
        assert!(ledger.resolve("1-2").is_ok());

        for raw in ["1-9", "9-1", "garbage", "1-0", ""] {
            assert!(
                matches!(ledger.resolve(raw), Err(LedgerError::ItemNotFound { .. })),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_set_status_and_counts() {
        let mut ledger = ledger();
        ledger.set_status(&[id(1, 1), id(1, 2)], ProductStatus::Sold);

        assert_eq!(ledger.get(&id(1, 1)).unwrap().status, ProductStatus::Sold);
        let counts = ledger.status_counts();
        assert_eq!(counts.get(&ProductStatus::Sold), Some(&2));
        assert_eq!(counts.get(&ProductStatus::Manufactured), Some(&2));
    }
}
