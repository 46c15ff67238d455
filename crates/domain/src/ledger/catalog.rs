//! Product catalog.

use std::collections::BTreeMap;

use common::{ManufacturerId, ProductId};
use serde::{Deserialize, Serialize};

use super::{LedgerError, Product, ToxicMaterial};

/// Owns product definitions keyed by their sequential id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCatalog {
    products: BTreeMap<ProductId, Product>,
    next_id: ProductId,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self {
            products: BTreeMap::new(),
            next_id: ProductId::first(),
        }
    }
}

impl ProductCatalog {
    /// Returns the product with `id`.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Returns the product with `id` or fails with `ProductNotFound`.
    pub fn require(&self, id: ProductId) -> Result<&Product, LedgerError> {
        self.get(id)
            .ok_or(LedgerError::ProductNotFound { product_id: id })
    }

    /// Returns the id the next created product will get.
    pub fn next_id(&self) -> ProductId {
        self.next_id
    }

    /// Returns the number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Returns all products in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Returns the products owned by `manufacturer`, in id order.
    pub fn owned_by<'a>(
        &'a self,
        manufacturer: &'a ManufacturerId,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .values()
            .filter(move |product| product.is_owned_by(manufacturer))
    }

    /// Pairs up the parallel name and weight arrays of a manifest.
    pub fn manifest(names: &[String], weights: &[u64]) -> Result<Vec<ToxicMaterial>, LedgerError> {
        if names.len() != weights.len() {
            return Err(LedgerError::LengthMismatch {
                names: names.len(),
                weights: weights.len(),
            });
        }

        Ok(names
            .iter()
            .zip(weights)
            .map(|(name, weight)| ToxicMaterial::new(name.clone(), *weight))
            .collect())
    }

    pub(super) fn insert(&mut self, product: Product) {
        if product.id >= self.next_id {
            self.next_id = product.id.next();
        }
        self.products.insert(product.id, product);
    }

    pub(super) fn record_items_added(&mut self, id: ProductId, count: u64) {
        if let Some(product) = self.products.get_mut(&id) {
            product.quantity += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: u64, owner: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            toxic_materials: vec![],
            manufacturer: ManufacturerId::new(owner),
            quantity: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut catalog = ProductCatalog::default();
        assert_eq!(catalog.next_id(), ProductId::new(1));

        catalog.insert(product(1, "M1"));
        assert_eq!(catalog.next_id(), ProductId::new(2));

        catalog.insert(product(2, "M1"));
        assert_eq!(catalog.next_id(), ProductId::new(3));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_manifest_pairs_names_with_weights() {
        let names = vec!["Lead".to_string(), "Mercury".to_string()];
        let manifest = ProductCatalog::manifest(&names, &[5, 2]).unwrap();

        assert_eq!(
            manifest,
            vec![ToxicMaterial::new("Lead", 5), ToxicMaterial::new("Mercury", 2)]
        );
        assert!(ProductCatalog::manifest(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_manifest_length_mismatch() {
        let names = vec!["Lead".to_string()];
        let result = ProductCatalog::manifest(&names, &[5, 2]);

        assert!(matches!(
            result,
            Err(LedgerError::LengthMismatch {
                names: 1,
                weights: 2
            })
        ));
    }

    #[test]
    fn test_record_items_added_grows_quantity() {
        let mut catalog = ProductCatalog::default();
        catalog.insert(product(1, "M1"));

        catalog.record_items_added(ProductId::new(1), 2);
        catalog.record_items_added(ProductId::new(1), 3);

        assert_eq!(catalog.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_owned_by_filters_by_manufacturer() {
        let mut catalog = ProductCatalog::default();
        catalog.insert(product(1, "M1"));
        catalog.insert(product(2, "M2"));
        catalog.insert(product(3, "M1"));

        let owner = ManufacturerId::new("M1");
        let ids: Vec<u64> = catalog.owned_by(&owner).map(|p| p.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_require_unknown_product() {
        let catalog = ProductCatalog::default();
        assert!(matches!(
            catalog.require(ProductId::new(9)),
            Err(LedgerError::ProductNotFound { .. })
        ));
    }
}
