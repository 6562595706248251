//! Cart operations
//!
//! Stock ceilings are enforced here, where the cart and the catalog can be
//! read under one lock. Cart lines are priced live: the subtotal is computed
//! from current variant prices on every read, so it can drift with the
//! catalog until checkout freezes it.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::cart::CartItem;
use crate::domain::aggregates::ProductVariant;
use crate::domain::value_objects::Money;
use crate::error::{EngineError, Result};
use crate::store::Store;

#[derive(Clone)]
pub struct CartService {
    store: Store,
}

/// Cart line joined with live catalog data.
#[derive(Clone, Debug, Serialize)]
pub struct CartLineView {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub title: String,
    pub sku: String,
    pub quantity: u32,
    pub is_preorder: bool,
    pub notes: Option<String>,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: Money,
}

fn line_view(item: &CartItem, variant: &ProductVariant) -> CartLineView {
    CartLineView {
        id: item.id,
        variant_id: item.variant_id,
        product_name: variant.product_name().to_string(),
        title: variant.title().to_string(),
        sku: variant.sku().to_string(),
        quantity: item.quantity,
        is_preorder: item.is_preorder,
        notes: item.notes.clone(),
        unit_price: variant.price().clone(),
        line_total: variant.price().multiply(item.quantity),
    }
}

impl CartService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Adds a line, merging into an existing (variant, preorder) row. The
    /// ceiling applies to the combined quantity, so repeated adds cannot
    /// creep past stock.
    pub fn add_item(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: u32,
        is_preorder: bool,
        notes: Option<String>,
    ) -> Result<CartLineView> {
        if quantity < 1 {
            return Err(EngineError::InvalidQuantity);
        }
        let mut state = self.store.write();
        let variant = state
            .variant(variant_id)
            .filter(|v| v.is_active())
            .ok_or(EngineError::NotFound)?
            .clone();
        let existing = state
            .cart(user_id)
            .map(|c| c.quantity_of(variant_id, is_preorder))
            .unwrap_or(0);
        if !is_preorder && !variant.has_stock_for(existing.saturating_add(quantity)) {
            return Err(EngineError::OutOfStock {
                variant: variant.display_name(),
            });
        }
        let item = state
            .cart_mut(user_id)
            .add_item(variant_id, quantity, is_preorder, notes)?
            .clone();
        Ok(line_view(&item, &variant))
    }

    /// Sets an absolute quantity; zero or negative deletes the line.
    /// Returns `None` when the line was deleted.
    pub fn update_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i64,
    ) -> Result<Option<CartLineView>> {
        let mut state = self.store.write();
        if quantity <= 0 {
            state.cart_mut(user_id).remove_item(item_id)?;
            return Ok(None);
        }
        let quantity = u32::try_from(quantity).map_err(|_| EngineError::InvalidQuantity)?;
        let item = state
            .cart(user_id)
            .and_then(|c| c.item(item_id))
            .ok_or(EngineError::NotFound)?
            .clone();
        let variant = state
            .variant(item.variant_id)
            .ok_or(EngineError::NotFound)?
            .clone();
        if !item.is_preorder && !variant.has_stock_for(quantity) {
            return Err(EngineError::OutOfStock {
                variant: variant.display_name(),
            });
        }
        state.cart_mut(user_id).set_quantity(item_id, quantity)?;
        let item = state
            .cart(user_id)
            .and_then(|c| c.item(item_id))
            .ok_or(EngineError::NotFound)?
            .clone();
        Ok(Some(line_view(&item, &variant)))
    }

    /// Ownership is checked before deletion: an item in another user's cart
    /// is indistinguishable from a missing one.
    pub fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        self.store.write().cart_mut(user_id).remove_item(item_id)
    }

    pub fn clear(&self, user_id: Uuid) {
        self.store.write().cart_mut(user_id).clear();
    }

    pub fn get_cart(&self, user_id: Uuid) -> CartView {
        let state = self.store.read();
        let mut items = vec![];
        let mut subtotal = Money::zero("AUD");
        if let Some(cart) = state.cart(user_id) {
            for item in cart.items() {
                // Variants are deactivated, never deleted, so this lookup
                // only misses if state was built by hand.
                let Some(variant) = state.variant(item.variant_id) else {
                    continue;
                };
                let view = line_view(item, variant);
                subtotal = subtotal.add(&view.line_total).unwrap_or(subtotal);
                items.push(view);
            }
        }
        CartView { items, subtotal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::seeded_store;
    use rust_decimal::Decimal;

    #[test]
    fn test_add_twice_merges_quantities() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 2, false, None).unwrap();
        let line = carts.add_item(user, variant_id, 3, false, None).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(carts.get_cart(user).items.len(), 1);
    }

    #[test]
    fn test_stock_ceiling_on_add() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        // Exactly S succeeds, S + 1 fails.
        carts.add_item(user, variant_id, 5, false, None).unwrap();
        let err = carts.add_item(user, variant_id, 1, false, None).unwrap_err();
        assert!(matches!(err, EngineError::OutOfStock { .. }));
    }

    #[test]
    fn test_preorder_bypasses_stock_ceiling() {
        let (store, variant_id) = seeded_store(0, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        let line = carts.add_item(user, variant_id, 3, true, None).unwrap();
        assert!(line.is_preorder);
    }

    #[test]
    fn test_update_quantity_ceiling_is_absolute() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        let line = carts.add_item(user, variant_id, 2, false, None).unwrap();
        assert!(carts.update_quantity(user, line.id, 5).is_ok());
        let err = carts.update_quantity(user, line.id, 6).unwrap_err();
        assert!(matches!(err, EngineError::OutOfStock { .. }));
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        let line = carts.add_item(user, variant_id, 2, false, None).unwrap();
        assert!(carts.update_quantity(user, line.id, 0).unwrap().is_none());
        assert!(carts.get_cart(user).items.is_empty());
    }

    #[test]
    fn test_cross_user_item_looks_missing() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let line = carts.add_item(owner, variant_id, 2, false, None).unwrap();
        assert_eq!(
            carts.remove_item(other, line.id).unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(carts.get_cart(owner).items.len(), 1);
    }

    #[test]
    fn test_subtotal_tracks_live_price() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 2, false, None).unwrap();
        assert_eq!(
            carts.get_cart(user).subtotal.amount(),
            Decimal::new(100, 0)
        );
        store
            .write()
            .variant_mut(variant_id)
            .unwrap()
            .update_price(Money::aud(Decimal::new(60, 0)));
        assert_eq!(
            carts.get_cart(user).subtotal.amount(),
            Decimal::new(120, 0)
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store);
        let user = Uuid::new_v4();
        carts.clear(user);
        assert!(carts.get_cart(user).items.is_empty());
    }
}
