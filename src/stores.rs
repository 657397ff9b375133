// 🏪 Store catalog - the fixed set of stores and what each one sells
//
// The payments export carries one revenue column per (store, product) pair,
// named "<Product> <StoreID>". Instead of matching those names by substring
// every time a view is drawn, the columns are resolved once at load time
// into an explicit store → products mapping held here.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DashboardError, Result};

// ============================================================================
// STORE ID
// ============================================================================

/// Identifier of one store, e.g. `ShopA`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        StoreId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for StoreId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Product column resolved from a payments header.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    pub store: StoreId,
    pub product: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub store: StoreId,
    pub products: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreCatalog {
    stores: Vec<StoreId>,
    products: BTreeMap<StoreId, Vec<String>>,
}

impl StoreCatalog {
    /// Build a catalog for the given store ids (order preserved, duplicates dropped).
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stores: Vec<StoreId> = Vec::new();
        for id in ids {
            let id = StoreId::new(id.into().trim());
            if !stores.contains(&id) {
                stores.push(id);
            }
        }

        StoreCatalog {
            stores,
            products: BTreeMap::new(),
        }
    }

    pub fn stores(&self) -> &[StoreId] {
        &self.stores
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.stores.iter().any(|s| s.as_str() == raw)
    }

    /// Map user or file input to a known store.
    pub fn resolve(&self, raw: &str) -> Result<StoreId> {
        let raw = raw.trim();
        self.stores
            .iter()
            .find(|s| s.as_str() == raw)
            .cloned()
            .ok_or_else(|| DashboardError::UnknownStore(raw.to_string()))
    }

    /// Interpret a payments header as a product column.
    ///
    /// Returns `None` when the last word of the header is not a known store.
    pub fn parse_product_column(&self, header: &str) -> Option<ProductKey> {
        let (product, store) = header.trim().rsplit_once(' ')?;
        let product = product.trim();
        if product.is_empty() {
            return None;
        }

        let store = self.resolve(store).ok()?;
        Some(ProductKey {
            store,
            product: product.to_string(),
        })
    }

    /// Record that `key.store` sells `key.product`. Each pair may appear once.
    pub fn register_product(&mut self, key: &ProductKey) -> Result<()> {
        let products = self.products.entry(key.store.clone()).or_default();
        if products.contains(&key.product) {
            return Err(DashboardError::Schema(format!(
                "duplicate product column '{} {}'",
                key.product, key.store
            )));
        }
        products.push(key.product.clone());
        Ok(())
    }

    /// Products sold by a store, in header order.
    pub fn products(&self, store: &StoreId) -> &[String] {
        self.products.get(store).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summaries(&self) -> Vec<StoreSummary> {
        self.stores
            .iter()
            .map(|store| StoreSummary {
                store: store.clone(),
                products: self.products(store).to_vec(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StoreCatalog {
        StoreCatalog::new(["ShopA", "ShopB", "ShopC"])
    }

    #[test]
    fn test_resolve_known_store() {
        let catalog = catalog();
        assert_eq!(catalog.resolve(" ShopB ").unwrap(), StoreId::new("ShopB"));
    }

    #[test]
    fn test_resolve_unknown_store() {
        let catalog = catalog();
        assert!(matches!(
            catalog.resolve("ShopZ"),
            Err(DashboardError::UnknownStore(s)) if s == "ShopZ"
        ));
    }

    #[test]
    fn test_new_drops_duplicates() {
        let catalog = StoreCatalog::new(["ShopA", "ShopA", "ShopB"]);
        assert_eq!(catalog.stores().len(), 2);
    }

    #[test]
    fn test_parse_product_column() {
        let catalog = catalog();
        let key = catalog.parse_product_column("Still Water ShopA").unwrap();
        assert_eq!(key.store, StoreId::new("ShopA"));
        assert_eq!(key.product, "Still Water");
    }

    #[test]
    fn test_parse_product_column_rejects_unknown_suffix() {
        let catalog = catalog();
        assert!(catalog.parse_product_column("Ice ShopQ").is_none());
        assert!(catalog.parse_product_column("Notes").is_none());
        assert!(catalog.parse_product_column(" ShopA").is_none());
    }

    #[test]
    fn test_register_product_rejects_duplicates() {
        let mut catalog = catalog();
        let key = catalog.parse_product_column("Ice ShopA").unwrap();
        catalog.register_product(&key).unwrap();

        assert!(matches!(
            catalog.register_product(&key),
            Err(DashboardError::Schema(_))
        ));
        assert_eq!(catalog.products(&StoreId::new("ShopA")), ["Ice".to_string()]);
        assert!(catalog.products(&StoreId::new("ShopB")).is_empty());
    }
}
