//! Order queries, status transitions, cancellation, and reorder
//!
//! Transitions are compare-and-swap: the lifecycle table is checked against
//! the current status under the store's write guard, and callers may also
//! pin the status they read (`expected`) to detect a concurrent move: an
//! admin double-clicking "Process" gets `StaleState`, not a silent
//! overwrite. Cross-user access reads as `NotFound`, never `Forbidden`, so
//! order existence is not confirmed to non-owners.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderEventType, OrderStatus};
use crate::domain::events::DomainEvent;
use crate::error::{EngineError, Result};
use crate::notify::OrderNotifier;
use crate::store::{State, Store};

#[derive(Clone)]
pub struct OrderService {
    store: Store,
    notifier: Arc<dyn OrderNotifier>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReorderedLine {
    pub variant_id: Uuid,
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedLine {
    pub variant_id: Uuid,
    pub name: String,
    pub reason: String,
}

/// Outcome of a reorder: which historical lines made it back into the cart
/// and which were skipped, so the caller can tell the user.
#[derive(Clone, Debug, Serialize)]
pub struct ReorderOutcome {
    pub added: Vec<ReorderedLine>,
    pub skipped: Vec<SkippedLine>,
}

impl OrderService {
    pub fn new(store: Store, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Orders visible to the caller, newest first. Admins see everything.
    pub fn list(
        &self,
        user_id: Uuid,
        is_admin: bool,
        page: u32,
        per_page: u32,
    ) -> (Vec<Order>, usize) {
        let state = self.store.read();
        let orders = if is_admin {
            state.all_orders()
        } else {
            state.orders_for(user_id)
        };
        let total = orders.len();
        let start = (page.saturating_sub(1) as usize) * per_page as usize;
        let page_items = orders
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        (page_items, total)
    }

    pub fn get(&self, user_id: Uuid, is_admin: bool, order_id: Uuid) -> Result<Order> {
        let state = self.store.read();
        let order = state.order(order_id).ok_or(EngineError::NotFound)?;
        if !is_admin && order.user_id() != user_id {
            return Err(EngineError::NotFound);
        }
        Ok(order.clone())
    }

    /// Admin-driven status change, validated against the lifecycle table.
    pub fn transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> Result<Order> {
        let (order, events) = {
            let mut state = self.store.write();
            self.apply_transition(&mut state, order_id, target, expected)?
        };
        for event in &events {
            self.notifier.publish(event);
        }
        Ok(order)
    }

    /// Customer- or admin-initiated cancellation. Goes through the same
    /// lifecycle gate as any transition, so it only succeeds from PENDING
    /// or PAID.
    pub fn cancel(&self, user_id: Uuid, is_admin: bool, order_id: Uuid) -> Result<Order> {
        let (order, events) = {
            let mut state = self.store.write();
            let order = state.order(order_id).ok_or(EngineError::NotFound)?;
            if !is_admin && order.user_id() != user_id {
                return Err(EngineError::NotFound);
            }
            self.apply_transition(&mut state, order_id, OrderStatus::Cancelled, None)?
        };
        for event in &events {
            self.notifier.publish(event);
        }
        Ok(order)
    }

    /// Re-adds a DONE order's lines to the cart at current catalog prices.
    /// Lines that no longer fit (gone, inactive, or short on stock) are
    /// skipped and reported; any other state fails without touching the cart.
    pub fn reorder(&self, user_id: Uuid, order_id: Uuid) -> Result<ReorderOutcome> {
        let mut state = self.store.write();
        let order = state.order(order_id).ok_or(EngineError::NotFound)?;
        if order.user_id() != user_id {
            return Err(EngineError::NotFound);
        }
        if !order.can_reorder() {
            return Err(EngineError::InvalidState);
        }
        let lines = order.items().to_vec();

        let mut added = vec![];
        let mut skipped = vec![];
        for line in lines {
            let available = state
                .variant(line.variant_id)
                .filter(|v| v.is_active())
                .map(|v| {
                    let in_cart = state
                        .cart(user_id)
                        .map(|c| c.quantity_of(line.variant_id, line.is_preorder))
                        .unwrap_or(0);
                    line.is_preorder || v.has_stock_for(in_cart.saturating_add(line.quantity))
                });
            match available {
                Some(true) => {
                    state.cart_mut(user_id).add_item(
                        line.variant_id,
                        line.quantity,
                        line.is_preorder,
                        None,
                    )?;
                    added.push(ReorderedLine {
                        variant_id: line.variant_id,
                        name: line.name,
                        quantity: line.quantity,
                    });
                }
                Some(false) => skipped.push(SkippedLine {
                    variant_id: line.variant_id,
                    name: line.name,
                    reason: "insufficient stock".into(),
                }),
                None => skipped.push(SkippedLine {
                    variant_id: line.variant_id,
                    name: line.name,
                    reason: "no longer available".into(),
                }),
            }
        }

        let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
        order.record(
            OrderEventType::Reordered,
            format!(
                "{} lines re-added to cart, {} skipped",
                added.len(),
                skipped.len()
            ),
            BTreeMap::from([
                ("added".into(), added.len().to_string()),
                ("skipped".into(), skipped.len().to_string()),
            ]),
        );
        Ok(ReorderOutcome { added, skipped })
    }

    fn apply_transition(
        &self,
        state: &mut State,
        order_id: Uuid,
        target: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> Result<(Order, Vec<DomainEvent>)> {
        let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
        if let Some(expected) = expected {
            if order.status() != expected {
                return Err(EngineError::StaleState);
            }
        }
        order.transition(target)?;
        let events = order.take_events();
        let restock: Vec<(Uuid, u32)> = if target == OrderStatus::Cancelled {
            order
                .items()
                .iter()
                .filter(|i| !i.is_preorder)
                .map(|i| (i.variant_id, i.quantity))
                .collect()
        } else {
            vec![]
        };

        if !restock.is_empty() {
            let mut units = 0u32;
            for (variant_id, quantity) in restock {
                if let Some(variant) = state.variant_mut(variant_id) {
                    variant.restock(quantity);
                    units += quantity;
                }
            }
            let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
            order.record(
                OrderEventType::Restocked,
                format!("{units} units returned to stock"),
                BTreeMap::from([("units".into(), units.to_string())]),
            );
        }

        let order = state.order(order_id).ok_or(EngineError::NotFound)?;
        Ok((order.clone(), events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::FulfillmentMethod;
    use crate::notify::NullNotifier;
    use crate::services::carts::CartService;
    use crate::services::testing::{checkout_service, seeded_store};
    use crate::domain::value_objects::Money;
    use rust_decimal::Decimal;

    fn service(store: &Store) -> OrderService {
        OrderService::new(store.clone(), Arc::new(NullNotifier))
    }

    fn place_pickup_order(store: &Store, user: Uuid, variant_id: Uuid, quantity: u32) -> Order {
        let carts = CartService::new(store.clone());
        carts.add_item(user, variant_id, quantity, false, None).unwrap();
        checkout_service(store)
            .create_order(user, FulfillmentMethod::Pickup, None, None, None)
            .unwrap()
    }

    fn walk_to_done(orders: &OrderService, store: &Store, order: &Order) {
        store
            .write()
            .order_mut(order.id())
            .unwrap()
            .attach_payment_intent("pi_done")
            .unwrap();
        store
            .write()
            .order_mut(order.id())
            .unwrap()
            .confirm_payment("pi_done")
            .unwrap();
        for status in [
            OrderStatus::Processed,
            OrderStatus::WaitingForPickup,
            OrderStatus::PickedUp,
            OrderStatus::Done,
        ] {
            orders.transition(order.id(), status, None).unwrap();
        }
    }

    #[test]
    fn test_stale_expected_status_conflicts() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 1);
        let orders = service(&store);

        store
            .write()
            .order_mut(order.id())
            .unwrap()
            .force_status(OrderStatus::Paid);
        // A second admin tab still sees PENDING.
        let err = orders
            .transition(order.id(), OrderStatus::Cancelled, Some(OrderStatus::Pending))
            .unwrap_err();
        assert_eq!(err, EngineError::StaleState);
        assert_eq!(
            store.read().order(order.id()).unwrap().status(),
            OrderStatus::Paid
        );
    }

    #[test]
    fn test_cancel_restocks_inventory() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 3);
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 7);

        let cancelled = service(&store).cancel(user, false, order.id()).unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 10);
        assert!(cancelled
            .events()
            .iter()
            .any(|e| e.event_type == OrderEventType::Restocked));
    }

    #[test]
    fn test_cancel_after_processing_rejected() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 1);
        let orders = service(&store);
        store
            .write()
            .order_mut(order.id())
            .unwrap()
            .force_status(OrderStatus::Processed);

        let err = orders.cancel(user, false, order.id()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                from: OrderStatus::Processed,
                to: OrderStatus::Cancelled,
            }
        );
        // Stock untouched, rejection audited.
        assert_eq!(store.read().variant(variant_id).unwrap().stock_on_hand(), 9);
        assert!(store
            .read()
            .order(order.id())
            .unwrap()
            .events()
            .iter()
            .any(|e| e.event_type == OrderEventType::TransitionRejected));
    }

    #[test]
    fn test_cross_user_order_reads_as_missing() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let order = place_pickup_order(&store, owner, variant_id, 1);
        let orders = service(&store);

        assert_eq!(
            orders.get(stranger, false, order.id()).unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(
            orders.cancel(stranger, false, order.id()).unwrap_err(),
            EngineError::NotFound
        );
        // Admin sees it.
        assert!(orders.get(stranger, true, order.id()).is_ok());
    }

    #[test]
    fn test_list_scopes_and_paginates() {
        let (store, variant_id) = seeded_store(100, Decimal::new(50, 0));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for _ in 0..3 {
            place_pickup_order(&store, a, variant_id, 1);
        }
        place_pickup_order(&store, b, variant_id, 1);
        let orders = service(&store);

        let (mine, total) = orders.list(a, false, 1, 2);
        assert_eq!(total, 3);
        assert_eq!(mine.len(), 2);
        let (all, total) = orders.list(a, true, 1, 10);
        assert_eq!(total, 4);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_reorder_requires_done() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 2);
        let orders = service(&store);

        let err = orders.reorder(user, order.id()).unwrap_err();
        assert_eq!(err, EngineError::InvalidState);
        assert!(store.read().cart(user).map_or(true, |c| c.is_empty()));
    }

    #[test]
    fn test_reorder_adds_lines_at_current_price() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 2);
        let orders = service(&store);
        walk_to_done(&orders, &store, &order);

        store
            .write()
            .variant_mut(variant_id)
            .unwrap()
            .update_price(Money::aud(Decimal::new(60, 0)));

        let outcome = orders.reorder(user, order.id()).unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert!(outcome.skipped.is_empty());
        let cart = CartService::new(store.clone()).get_cart(user);
        assert_eq!(cart.subtotal.amount(), Decimal::new(120, 0));
        // The historical order is untouched.
        assert_eq!(
            store.read().order(order.id()).unwrap().total_aud().amount(),
            Decimal::new(100, 0)
        );
    }

    #[test]
    fn test_reorder_skips_unavailable_lines() {
        let (store, variant_id) = seeded_store(10, Decimal::new(50, 0));
        let user = Uuid::new_v4();
        let order = place_pickup_order(&store, user, variant_id, 2);
        let orders = service(&store);
        walk_to_done(&orders, &store, &order);

        store.write().variant_mut(variant_id).unwrap().set_stock(1);
        let outcome = orders.reorder(user, order.id()).unwrap();
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, "insufficient stock");
        assert!(store.read().cart(user).map_or(true, |c| c.is_empty()));
    }
}
