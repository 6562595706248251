//! In-memory storefront state
//!
//! All entities live behind one `RwLock`. Multi-step operations (checkout,
//! status transitions, reorder) hold the write guard across their whole
//! validate-then-mutate sequence, which is what gives them their atomicity
//! and compare-and-swap guarantees: two racing checkouts serialize here, and
//! the loser observes the winner's stock decrement.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::domain::aggregates::{Address, Cart, Order, ProductVariant};

/// Cheaply cloneable handle; clones share the same underlying state.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<State>>,
}

#[derive(Default)]
pub struct State {
    variants: HashMap<Uuid, ProductVariant>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
    addresses: HashMap<Uuid, Address>,
    order_numbers: HashSet<String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.write()
    }
}

impl State {
    // Catalog

    pub fn insert_variant(&mut self, variant: ProductVariant) {
        self.variants.insert(variant.id(), variant);
    }

    pub fn variant(&self, id: Uuid) -> Option<&ProductVariant> {
        self.variants.get(&id)
    }

    pub fn variant_mut(&mut self, id: Uuid) -> Option<&mut ProductVariant> {
        self.variants.get_mut(&id)
    }

    /// Active variants, newest first.
    pub fn active_variants(&self) -> Vec<&ProductVariant> {
        let mut variants: Vec<_> = self.variants.values().filter(|v| v.is_active()).collect();
        variants.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        variants
    }

    // Carts

    pub fn cart(&self, user_id: Uuid) -> Option<&Cart> {
        self.carts.get(&user_id)
    }

    pub fn cart_mut(&mut self, user_id: Uuid) -> &mut Cart {
        self.carts.entry(user_id).or_insert_with(|| Cart::new(user_id))
    }

    // Orders

    pub fn insert_order(&mut self, order: Order) {
        self.order_numbers.insert(order.order_number().to_string());
        self.orders.insert(order.id(), order);
    }

    pub fn order(&self, id: Uuid) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn order_mut(&mut self, id: Uuid) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    pub fn order_number_taken(&self, number: &str) -> bool {
        self.order_numbers.contains(number)
    }

    /// A user's orders, newest first.
    pub fn orders_for(&self, user_id: Uuid) -> Vec<&Order> {
        let mut orders: Vec<_> = self
            .orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }

    /// Every order, newest first. Admin listings only.
    pub fn all_orders(&self) -> Vec<&Order> {
        let mut orders: Vec<_> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }

    // Addresses

    pub fn insert_address(&mut self, address: Address) {
        self.addresses.insert(address.id(), address);
    }

    pub fn address(&self, id: Uuid) -> Option<&Address> {
        self.addresses.get(&id)
    }

    pub fn addresses_for(&self, user_id: Uuid) -> Vec<&Address> {
        let mut addresses: Vec<_> = self
            .addresses
            .values()
            .filter(|a| a.user_id() == user_id)
            .collect();
        addresses.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Money, Sku};
    use rust_decimal::Decimal;

    #[test]
    fn test_clones_share_state() {
        let store = Store::new();
        let handle = store.clone();
        let variant = ProductVariant::create(
            Sku::new("LPG-9KG").unwrap(),
            "Household LPG",
            "9kg cylinder",
            Money::aud(Decimal::new(50, 0)),
            5,
        );
        let id = variant.id();
        store.write().insert_variant(variant);
        assert!(handle.read().variant(id).is_some());
    }

    #[test]
    fn test_cart_created_on_demand() {
        let store = Store::new();
        let user = Uuid::new_v4();
        assert!(store.read().cart(user).is_none());
        store.write().cart_mut(user);
        assert!(store.read().cart(user).is_some());
    }
}
