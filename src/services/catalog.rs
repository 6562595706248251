//! Catalog maintenance and browsing

use uuid::Uuid;

use crate::domain::aggregates::ProductVariant;
use crate::domain::value_objects::{Money, Sku};
use crate::error::{EngineError, Result};
use crate::store::Store;

#[derive(Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create_variant(
        &self,
        sku: Sku,
        product_name: impl Into<String>,
        title: impl Into<String>,
        price: Money,
        stock_on_hand: u32,
    ) -> ProductVariant {
        let variant = ProductVariant::create(sku, product_name, title, price, stock_on_hand);
        self.store.write().insert_variant(variant.clone());
        variant
    }

    pub fn list(&self, page: u32, per_page: u32) -> (Vec<ProductVariant>, usize) {
        let state = self.store.read();
        let variants = state.active_variants();
        let total = variants.len();
        let start = (page.saturating_sub(1) as usize) * per_page as usize;
        let page_items = variants
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        (page_items, total)
    }

    pub fn get(&self, id: Uuid) -> Result<ProductVariant> {
        self.store
            .read()
            .variant(id)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    pub fn set_stock(&self, id: Uuid, stock_on_hand: u32) -> Result<ProductVariant> {
        let mut state = self.store.write();
        let variant = state.variant_mut(id).ok_or(EngineError::NotFound)?;
        variant.set_stock(stock_on_hand);
        Ok(variant.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_create_and_restock() {
        let catalog = CatalogService::new(Store::new());
        let variant = catalog.create_variant(
            Sku::new("LPG-9KG").unwrap(),
            "Household LPG",
            "9kg cylinder",
            Money::aud(Decimal::new(50, 0)),
            0,
        );
        let updated = catalog.set_stock(variant.id(), 25).unwrap();
        assert_eq!(updated.stock_on_hand(), 25);
        let (listed, total) = catalog.list(1, 20);
        assert_eq!(total, 1);
        assert_eq!(listed[0].id(), variant.id());
    }

    #[test]
    fn test_unknown_variant_not_found() {
        let catalog = CatalogService::new(Store::new());
        assert_eq!(
            catalog.get(Uuid::new_v4()).unwrap_err(),
            EngineError::NotFound
        );
    }
}
