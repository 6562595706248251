//! Product variant aggregate
//!
//! A variant is the purchasable unit of the catalog (a specific cylinder
//! size/weight). Cart lines and order lines reference variants by id; prices
//! are read live from here until the order factory freezes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Money, Quantity, Sku};
use crate::error::{EngineError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductVariant {
    id: Uuid,
    sku: Sku,
    product_name: String,
    /// Variant title, e.g. "9kg cylinder".
    title: String,
    price: Money,
    stock_on_hand: Quantity,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductVariant {
    pub fn create(
        sku: Sku,
        product_name: impl Into<String>,
        title: impl Into<String>,
        price: Money,
        stock_on_hand: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sku,
            product_name: product_name.into(),
            title: title.into(),
            price,
            stock_on_hand: Quantity::new(stock_on_hand),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn sku(&self) -> &Sku {
        &self.sku
    }
    pub fn product_name(&self) -> &str {
        &self.product_name
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn price(&self) -> &Money {
        &self.price
    }
    pub fn stock_on_hand(&self) -> u32 {
        self.stock_on_hand.value()
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display name for error messages and order lines,
    /// e.g. "Household LPG (9kg cylinder)".
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.product_name, self.title)
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock_on_hand.value()
    }

    /// Removes `quantity` units from stock. Callers must have already
    /// validated availability inside the same critical section.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        self.stock_on_hand =
            self.stock_on_hand
                .subtract(quantity)
                .ok_or_else(|| EngineError::OutOfStock {
                    variant: self.display_name(),
                })?;
        self.touch();
        Ok(())
    }

    /// Returns units to stock, e.g. when a paid order is cancelled.
    pub fn restock(&mut self, quantity: u32) {
        self.stock_on_hand = self.stock_on_hand.add(quantity);
        self.touch();
    }

    pub fn set_stock(&mut self, quantity: u32) {
        self.stock_on_hand = Quantity::new(quantity);
        self.touch();
    }

    pub fn update_price(&mut self, price: Money) {
        self.price = price;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn cylinder(stock: u32) -> ProductVariant {
        ProductVariant::create(
            Sku::new("LPG-9KG").unwrap(),
            "Household LPG",
            "9kg cylinder",
            Money::aud(Decimal::new(50, 0)),
            stock,
        )
    }

    #[test]
    fn test_reserve_and_restock() {
        let mut v = cylinder(10);
        v.reserve(4).unwrap();
        assert_eq!(v.stock_on_hand(), 6);
        v.restock(2);
        assert_eq!(v.stock_on_hand(), 8);
    }

    #[test]
    fn test_reserve_beyond_stock_fails() {
        let mut v = cylinder(1);
        let err = v.reserve(2).unwrap_err();
        assert!(matches!(err, EngineError::OutOfStock { .. }));
        assert_eq!(v.stock_on_hand(), 1);
    }
}
