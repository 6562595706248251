//! Checkout: cart snapshot to immutable order
//!
//! The whole sequence (empty-cart check, address resolution, stock
//! revalidation, price freeze, stock decrement, order creation, cart clear)
//! runs under one store write guard. Either all of it happens or none of it:
//! a failure partway through can only occur before the first mutation, so a
//! cleared cart without an order (or the reverse) is never observable.
//!
//! Stock is decremented at order creation and returned on cancellation.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::aggregates::order::{FulfillmentMethod, Order, OrderItem, ShippingAddress};
use crate::domain::value_objects::Money;
use crate::error::{EngineError, Result};
use crate::notify::OrderNotifier;
use crate::services::shipping::ShippingRateProvider;
use crate::store::Store;

#[derive(Clone)]
pub struct CheckoutService {
    store: Store,
    shipping: Arc<dyn ShippingRateProvider>,
    notifier: Arc<dyn OrderNotifier>,
}

impl CheckoutService {
    pub fn new(
        store: Store,
        shipping: Arc<dyn ShippingRateProvider>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            store,
            shipping,
            notifier,
        }
    }

    /// Converts the user's cart into a PENDING order.
    ///
    /// Delivery orders need an address: either a saved `address_id` (which
    /// must belong to the user) or an inline `shipping_address`. Stock is
    /// revalidated per line against racing checkouts; the loser of a race
    /// fails `OutOfStock` and keeps its cart.
    pub fn create_order(
        &self,
        user_id: Uuid,
        fulfillment_method: FulfillmentMethod,
        address_id: Option<Uuid>,
        shipping_address: Option<ShippingAddress>,
        customer_notes: Option<String>,
    ) -> Result<Order> {
        let mut state = self.store.write();

        let cart_items: Vec<_> = state
            .cart(user_id)
            .map(|c| c.items().to_vec())
            .unwrap_or_default();
        if cart_items.is_empty() {
            return Err(EngineError::EmptyCart);
        }

        let address = match fulfillment_method {
            FulfillmentMethod::Pickup => None,
            FulfillmentMethod::Delivery => Some(match address_id {
                Some(id) => state
                    .address(id)
                    .filter(|a| a.user_id() == user_id)
                    .ok_or(EngineError::NotFound)?
                    .to_shipping(),
                None => shipping_address.ok_or(EngineError::AddressRequired)?,
            }),
        };

        // Validate every line before mutating anything; the same guard is
        // held through the decrement below, so the check cannot go stale.
        let mut order_items = Vec::with_capacity(cart_items.len());
        let mut subtotal = Money::zero("AUD");
        for item in &cart_items {
            let variant = state
                .variant(item.variant_id)
                .filter(|v| v.is_active())
                .ok_or(EngineError::NotFound)?;
            if !item.is_preorder && !variant.has_stock_for(item.quantity) {
                return Err(EngineError::OutOfStock {
                    variant: variant.display_name(),
                });
            }
            let unit_price = variant.price().clone();
            let line_total = unit_price.multiply(item.quantity);
            subtotal = subtotal.add(&line_total).unwrap_or(subtotal);
            order_items.push(OrderItem {
                id: Uuid::new_v4(),
                variant_id: item.variant_id,
                name: variant.display_name(),
                sku: variant.sku().to_string(),
                quantity: item.quantity,
                is_preorder: item.is_preorder,
                unit_price_aud: unit_price,
                total_price_aud: line_total,
            });
        }

        let shipping_cost = match &address {
            Some(addr) => self.shipping.delivery_rate(addr, &subtotal),
            None => Money::zero("AUD"),
        };
        let total = subtotal.add(&shipping_cost).unwrap_or(subtotal.clone());

        let order_number = loop {
            let candidate = format!("ORD-{:08}", rand::random::<u32>() % 100_000_000);
            if !state.order_number_taken(&candidate) {
                break candidate;
            }
        };

        for item in &cart_items {
            if item.is_preorder {
                continue;
            }
            if let Some(variant) = state.variant_mut(item.variant_id) {
                variant.reserve(item.quantity)?;
            }
        }

        let mut order = Order::create(
            user_id,
            order_number,
            fulfillment_method,
            order_items,
            subtotal,
            shipping_cost,
            total,
            address,
            customer_notes,
        );
        let events = order.take_events();
        state.cart_mut(user_id).clear();
        let snapshot = order.clone();
        state.insert_order(order);
        drop(state);

        for event in &events {
            self.notifier.publish(event);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::value_objects::Sku;
    use crate::domain::aggregates::ProductVariant;
    use crate::services::carts::CartService;
    use crate::services::testing::{checkout_service, seeded_store};
    use rust_decimal::Decimal;

    #[test]
    fn test_pickup_checkout_scenario() {
        // Cart {variant: qty 2 @ $50}, stock 10, pickup: subtotal 100.00,
        // shipping 0.00, total 100.00, PENDING, cart emptied.
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 2, false, None).unwrap();

        let order = checkout_service(&store)
            .create_order(user, FulfillmentMethod::Pickup, None, None, None)
            .unwrap();
        assert_eq!(order.subtotal_aud().amount(), Decimal::new(100, 0));
        assert_eq!(order.shipping_cost_aud().amount(), Decimal::ZERO);
        assert_eq!(order.total_aud().amount(), Decimal::new(100, 0));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(carts.get_cart(user).items.is_empty());
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 8);
    }

    #[test]
    fn test_delivery_requires_address() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 1, false, None).unwrap();
        let err = checkout_service(&store)
            .create_order(user, FulfillmentMethod::Delivery, None, None, None)
            .unwrap_err();
        assert_eq!(err, EngineError::AddressRequired);
        // Nothing happened.
        assert_eq!(carts.get_cart(user).items.len(), 1);
    }

    #[test]
    fn test_delivery_charges_flat_rate() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 1, false, None).unwrap();
        let order = checkout_service(&store)
            .create_order(
                user,
                FulfillmentMethod::Delivery,
                None,
                Some(ShippingAddress {
                    label: "Home".into(),
                    street_address: "1 Gasworks Rd".into(),
                    suburb: "Richmond".into(),
                    state: "VIC".into(),
                    postcode: "3121".into(),
                    country: "Australia".into(),
                    delivery_instructions: None,
                }),
                None,
            )
            .unwrap();
        assert_eq!(order.shipping_cost_aud().amount(), Decimal::new(995, 2));
        assert_eq!(order.total_aud().amount(), Decimal::new(5995, 2));
    }

    #[test]
    fn test_foreign_saved_address_rejected() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let address = crate::domain::aggregates::Address::create(
            owner,
            "Home",
            "1 Gasworks Rd",
            "Richmond",
            "VIC",
            "3121",
            "Australia",
            None,
        );
        let address_id = address.id();
        store.write().insert_address(address);
        carts.add_item(user, variant_id, 1, false, None).unwrap();
        let err = checkout_service(&store)
            .create_order(
                user,
                FulfillmentMethod::Delivery,
                Some(address_id),
                None,
                None,
            )
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let (store, _) = seeded_store(10, Decimal::new(50, 0));
        let err = checkout_service(&store)
            .create_order(Uuid::new_v4(), FulfillmentMethod::Pickup, None, None, None)
            .unwrap_err();
        assert_eq!(err, EngineError::EmptyCart);
    }

    #[test]
    fn test_failed_checkout_leaves_cart_and_stock_intact() {
        let (store, in_stock) = seeded_store(10, Decimal::new(50, 0));
        let short = ProductVariant::create(
            Sku::new("LPG-45KG").unwrap(),
            "Household LPG",
            "45kg cylinder",
            Money::aud(Decimal::new(160, 0)),
            1,
        );
        let short_id = short.id();
        store.write().insert_variant(short);

        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, in_stock, 2, false, None).unwrap();
        // Bypass the add-time ceiling to simulate a racing checkout having
        // taken the stock after this cart was built.
        carts.add_item(user, short_id, 1, false, None).unwrap();
        store.write().variant_mut(short_id).unwrap().set_stock(0);

        let err = checkout_service(&store)
            .create_order(user, FulfillmentMethod::Pickup, None, None, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::OutOfStock { .. }));
        assert_eq!(carts.get_cart(user).items.len(), 2);
        assert_eq!(store.read().variant(in_stock).unwrap().stock_on_hand(), 10);
        assert!(store.read().all_orders().is_empty());
    }

    #[test]
    fn test_order_prices_frozen_against_catalog_changes() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 2, false, None).unwrap();
        let order = checkout_service(&store)
            .create_order(user, FulfillmentMethod::Pickup, None, None, None)
            .unwrap();

        store
            .write()
            .variant_mut(variant_id)
            .unwrap()
            .update_price(Money::aud(Decimal::new(75, 0)));

        let state = store.read();
        let stored = state.order(order.id()).unwrap();
        assert_eq!(stored.items()[0].unit_price_aud.amount(), Decimal::new(50, 0));
        assert_eq!(stored.total_aud().amount(), Decimal::new(100, 0));
    }

    #[test]
    fn test_preorder_lines_skip_stock() {
        let (store, variant_id) = seeded_store(0, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 3, true, None).unwrap();
        let order = checkout_service(&store)
            .create_order(user, FulfillmentMethod::Pickup, None, None, None)
            .unwrap();
        assert!(order.items()[0].is_preorder);
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 0);
    }

    #[test]
    fn test_concurrent_checkouts_one_winner() {
        // Two users race for the last cylinder; exactly one order exists
        // afterwards and the loser sees OutOfStock.
        let (store, variant_id) = seeded_store(1, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        carts.add_item(a, variant_id, 1, false, None).unwrap();
        carts.add_item(b, variant_id, 1, false, None).unwrap();

        let service = checkout_service(&store);
        let results: Vec<_> = [a, b]
            .map(|user| {
                let service = service.clone();
                std::thread::spawn(move || {
                    service.create_order(user, FulfillmentMethod::Pickup, None, None, None)
                })
            })
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            EngineError::OutOfStock { .. }
        ));
        assert_eq!(store.read().all_orders().len(), 1);
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 0);
    }

    #[test]
    fn test_double_submit_creates_single_order() {
        let (store, variant_id) = seeded_store(5, Decimal::new(50, 0));
        let carts = CartService::new(store.clone());
        let user = Uuid::new_v4();
        carts.add_item(user, variant_id, 1, false, None).unwrap();

        let service = checkout_service(&store);
        let results: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || {
                    service.create_order(user, FulfillmentMethod::Pickup, None, None, None)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.read().all_orders().len(), 1);
    }
}
