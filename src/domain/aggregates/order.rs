//! Order aggregate
//!
//! An order is an immutable snapshot of a cart at checkout time plus a status
//! that only moves through the lifecycle below. Prices are frozen at
//! creation; later catalog changes never touch an existing order.
//!
//! ```text
//!   PENDING ──► PAID ──► PROCESSED ──► WAITING_FOR_PICKUP ──► PICKED_UP ──► DONE
//!      │          │           └───────► ON_DELIVERY ─────────────────────► DONE
//!      └──────────┴──► CANCELLED
//! ```
//!
//! The PROCESSED branch is selected by the order's fulfillment method. DONE
//! and CANCELLED are terminal. Every attempted transition, legal or not, is
//! recorded in the append-only event log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Money;
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processed,
    WaitingForPickup,
    OnDelivery,
    PickedUp,
    Done,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order. Used by exhaustive transition tests
    /// and the admin status dropdown.
    pub const ALL: [OrderStatus; 8] = [
        Self::Pending,
        Self::Paid,
        Self::Processed,
        Self::WaitingForPickup,
        Self::OnDelivery,
        Self::PickedUp,
        Self::Done,
        Self::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// States reachable from this one for an order with the given
    /// fulfillment method. Forward-only; nothing may be skipped.
    pub fn next_states(&self, method: FulfillmentMethod) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Paid, Self::Cancelled],
            Self::Paid => &[Self::Processed, Self::Cancelled],
            Self::Processed => match method {
                FulfillmentMethod::Pickup => &[Self::WaitingForPickup],
                FulfillmentMethod::Delivery => &[Self::OnDelivery],
            },
            Self::WaitingForPickup => &[Self::PickedUp],
            Self::PickedUp => &[Self::Done],
            Self::OnDelivery => &[Self::Done],
            Self::Done | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus, method: FulfillmentMethod) -> bool {
        self.next_states(method).contains(&target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Processed => "PROCESSED",
            Self::WaitingForPickup => "WAITING_FOR_PICKUP",
            Self::OnDelivery => "ON_DELIVERY",
            Self::PickedUp => "PICKED_UP",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or(EngineError::NotFound)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentMethod {
    Delivery,
    Pickup,
}

/// Order line with prices frozen at checkout time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub is_preorder: bool,
    pub unit_price_aud: Money,
    pub total_price_aud: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    Created,
    StatusChanged,
    TransitionRejected,
    PaymentAttached,
    PaymentReceived,
    PaymentFailed,
    Cancelled,
    Restocked,
    Reordered,
}

/// Append-only audit record. Never edited or deleted; ordered by creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Delivery address copied onto the order at checkout.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub label: String,
    pub street_address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub delivery_instructions: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    order_number: String,
    status: OrderStatus,
    fulfillment_method: FulfillmentMethod,
    items: Vec<OrderItem>,
    subtotal_aud: Money,
    shipping_cost_aud: Money,
    total_aud: Money,
    address: Option<ShippingAddress>,
    customer_notes: Option<String>,
    stripe_payment_intent_id: Option<String>,
    pickup_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<OrderEvent>,
    #[serde(skip, default)]
    pending_events: Vec<DomainEvent>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        user_id: Uuid,
        order_number: String,
        fulfillment_method: FulfillmentMethod,
        items: Vec<OrderItem>,
        subtotal_aud: Money,
        shipping_cost_aud: Money,
        total_aud: Money,
        address: Option<ShippingAddress>,
        customer_notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::new_v4(),
            user_id,
            order_number,
            status: OrderStatus::Pending,
            fulfillment_method,
            items,
            subtotal_aud,
            shipping_cost_aud,
            total_aud,
            address,
            customer_notes,
            stripe_payment_intent_id: None,
            pickup_code: None,
            created_at: now,
            updated_at: now,
            events: vec![],
            pending_events: vec![],
        };
        order.record(
            OrderEventType::Created,
            format!("order {} placed", order.order_number),
            BTreeMap::new(),
        );
        order.raise(DomainEvent::OrderCreated {
            user_id,
            order_id: order.id,
            order_number: order.order_number.clone(),
            occurred_at: now,
        });
        order
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
    pub fn order_number(&self) -> &str {
        &self.order_number
    }
    pub fn status(&self) -> OrderStatus {
        self.status
    }
    pub fn fulfillment_method(&self) -> FulfillmentMethod {
        self.fulfillment_method
    }
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
    pub fn subtotal_aud(&self) -> &Money {
        &self.subtotal_aud
    }
    pub fn shipping_cost_aud(&self) -> &Money {
        &self.shipping_cost_aud
    }
    pub fn total_aud(&self) -> &Money {
        &self.total_aud
    }
    pub fn address(&self) -> Option<&ShippingAddress> {
        self.address.as_ref()
    }
    pub fn customer_notes(&self) -> Option<&str> {
        self.customer_notes.as_deref()
    }
    pub fn stripe_payment_intent_id(&self) -> Option<&str> {
        self.stripe_payment_intent_id.as_deref()
    }
    pub fn pickup_code(&self) -> Option<&str> {
        self.pickup_code.as_deref()
    }
    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Action visibility is computed here, never trusted from the client.

    pub fn can_cancel(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Paid)
    }

    pub fn can_download_receipt(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Paid
                | OrderStatus::Processed
                | OrderStatus::WaitingForPickup
                | OrderStatus::PickedUp
                | OrderStatus::OnDelivery
                | OrderStatus::Done
        )
    }

    pub fn can_reorder(&self) -> bool {
        self.status == OrderStatus::Done
    }

    /// Moves the order to `target` if the lifecycle allows it.
    ///
    /// A rejected transition leaves the status untouched but is still
    /// recorded in the event log, so admin double-clicks and out-of-order
    /// webhooks stay observable.
    pub fn transition(&mut self, target: OrderStatus) -> Result<()> {
        let from = self.shift(target)?;
        if target == OrderStatus::Cancelled {
            self.record(
                OrderEventType::Cancelled,
                format!("order cancelled while {from}"),
                BTreeMap::from([("from".into(), from.to_string())]),
            );
        } else {
            self.record(
                OrderEventType::StatusChanged,
                format!("status changed from {from} to {target}"),
                BTreeMap::from([
                    ("from".into(), from.to_string()),
                    ("to".into(), target.to_string()),
                ]),
            );
        }
        Ok(())
    }

    /// Binds a payment intent. Only a freshly created order can start a
    /// payment flow.
    pub fn attach_payment_intent(&mut self, intent_id: impl Into<String>) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(EngineError::InvalidState);
        }
        let intent_id = intent_id.into();
        self.record(
            OrderEventType::PaymentAttached,
            "payment intent attached".into(),
            BTreeMap::from([("payment_intent_id".into(), intent_id.clone())]),
        );
        self.stripe_payment_intent_id = Some(intent_id);
        self.touch();
        Ok(())
    }

    /// Confirms payment against the attached intent and moves PENDING → PAID.
    pub fn confirm_payment(&mut self, intent_id: &str) -> Result<()> {
        match self.stripe_payment_intent_id.as_deref() {
            Some(attached) if attached == intent_id => {}
            _ => return Err(EngineError::IntentMismatch),
        }
        self.shift(OrderStatus::Paid)?;
        self.record(
            OrderEventType::PaymentReceived,
            format!("payment received for {}", self.total_aud.amount()),
            BTreeMap::from([("payment_intent_id".into(), intent_id.to_string())]),
        );
        Ok(())
    }

    /// Records a failed payment attempt. The order stays PENDING so the
    /// customer can retry.
    pub fn fail_payment(&mut self, reason: &str) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(EngineError::InvalidState);
        }
        self.record(
            OrderEventType::PaymentFailed,
            format!("payment failed: {reason}"),
            BTreeMap::from([("reason".into(), reason.to_string())]),
        );
        Ok(())
    }

    /// Appends an audit entry. Used by the service layer for events whose
    /// outcome the aggregate cannot see (restocks, reorders).
    pub fn record(
        &mut self,
        event_type: OrderEventType,
        description: String,
        metadata: BTreeMap<String, String>,
    ) {
        self.events.push(OrderEvent {
            event_type,
            description,
            metadata,
            created_at: Utc::now(),
        });
    }

    /// Drains notification events raised since the last call. Published by
    /// the service layer after the store write completes.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn shift(&mut self, target: OrderStatus) -> Result<OrderStatus> {
        let from = self.status;
        if !from.can_transition_to(target, self.fulfillment_method) {
            self.record(
                OrderEventType::TransitionRejected,
                format!("rejected transition from {from} to {target}"),
                BTreeMap::from([
                    ("from".into(), from.to_string()),
                    ("to".into(), target.to_string()),
                ]),
            );
            return Err(EngineError::InvalidTransition { from, to: target });
        }
        self.status = target;
        if target == OrderStatus::WaitingForPickup && self.pickup_code.is_none() {
            self.pickup_code = Some(format!("{:06}", rand::random::<u32>() % 1_000_000));
        }
        self.touch();
        self.raise(DomainEvent::OrderStatusChanged {
            user_id: self.user_id,
            order_id: self.id,
            order_number: self.order_number.clone(),
            new_status: target,
            occurred_at: self.updated_at,
        });
        Ok(from)
    }

    fn raise(&mut self, event: DomainEvent) {
        self.pending_events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn force_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order(method: FulfillmentMethod) -> Order {
        let price = Money::aud(Decimal::new(50, 0));
        let item = OrderItem {
            id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            name: "Household LPG (9kg cylinder)".into(),
            sku: "LPG-9KG".into(),
            quantity: 2,
            is_preorder: false,
            unit_price_aud: price.clone(),
            total_price_aud: price.multiply(2),
        };
        Order::create(
            Uuid::new_v4(),
            "ORD-00000001".into(),
            method,
            vec![item],
            Money::aud(Decimal::new(100, 0)),
            Money::zero("AUD"),
            Money::aud(Decimal::new(100, 0)),
            None,
            None,
        )
    }

    #[test]
    fn test_pickup_walk_assigns_code() {
        let mut o = order(FulfillmentMethod::Pickup);
        o.attach_payment_intent("pi_1").unwrap();
        o.confirm_payment("pi_1").unwrap();
        o.transition(OrderStatus::Processed).unwrap();
        assert!(o.pickup_code().is_none());
        o.transition(OrderStatus::WaitingForPickup).unwrap();
        assert!(o.pickup_code().is_some());
        o.transition(OrderStatus::PickedUp).unwrap();
        o.transition(OrderStatus::Done).unwrap();
        assert!(o.status().is_terminal());
    }

    #[test]
    fn test_delivery_cannot_enter_pickup_branch() {
        let mut o = order(FulfillmentMethod::Delivery);
        o.force_status(OrderStatus::Processed);
        o.transition(OrderStatus::OnDelivery).unwrap();
        let err = o.transition(OrderStatus::WaitingForPickup).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                from: OrderStatus::OnDelivery,
                to: OrderStatus::WaitingForPickup,
            }
        );
        assert_eq!(o.status(), OrderStatus::OnDelivery);
    }

    #[test]
    fn test_transition_closure() {
        // Every (from, target) pair outside the table must fail, leave the
        // status unchanged, and append a rejected-transition event.
        for method in [FulfillmentMethod::Pickup, FulfillmentMethod::Delivery] {
            for from in OrderStatus::ALL {
                for target in OrderStatus::ALL {
                    if from.can_transition_to(target, method) {
                        continue;
                    }
                    let mut o = order(method);
                    o.force_status(from);
                    let events_before = o.events().len();
                    let err = o.transition(target).unwrap_err();
                    assert_eq!(err, EngineError::InvalidTransition { from, to: target });
                    assert_eq!(o.status(), from);
                    let last = o.events().last().unwrap();
                    assert_eq!(last.event_type, OrderEventType::TransitionRejected);
                    assert_eq!(o.events().len(), events_before + 1);
                }
            }
        }
    }

    #[test]
    fn test_cancel_window() {
        for status in OrderStatus::ALL {
            let mut o = order(FulfillmentMethod::Pickup);
            o.force_status(status);
            let cancellable = matches!(status, OrderStatus::Pending | OrderStatus::Paid);
            assert_eq!(o.can_cancel(), cancellable);
            assert_eq!(o.transition(OrderStatus::Cancelled).is_ok(), cancellable);
        }
    }

    #[test]
    fn test_attach_intent_requires_pending() {
        let mut o = order(FulfillmentMethod::Pickup);
        o.force_status(OrderStatus::Paid);
        assert_eq!(
            o.attach_payment_intent("pi_1").unwrap_err(),
            EngineError::InvalidState
        );
    }

    #[test]
    fn test_confirm_payment_intent_mismatch() {
        let mut o = order(FulfillmentMethod::Pickup);
        o.attach_payment_intent("pi_1").unwrap();
        assert_eq!(
            o.confirm_payment("pi_2").unwrap_err(),
            EngineError::IntentMismatch
        );
        assert_eq!(o.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_confirm_payment_records_receipt() {
        let mut o = order(FulfillmentMethod::Pickup);
        o.attach_payment_intent("pi_1").unwrap();
        o.confirm_payment("pi_1").unwrap();
        assert_eq!(o.status(), OrderStatus::Paid);
        assert!(o
            .events()
            .iter()
            .any(|e| e.event_type == OrderEventType::PaymentReceived));
    }

    #[test]
    fn test_failed_payment_keeps_order_pending() {
        let mut o = order(FulfillmentMethod::Pickup);
        o.attach_payment_intent("pi_1").unwrap();
        o.fail_payment("card declined").unwrap();
        assert_eq!(o.status(), OrderStatus::Pending);
        assert!(o
            .events()
            .iter()
            .any(|e| e.event_type == OrderEventType::PaymentFailed));
    }

    #[test]
    fn test_receipt_visibility() {
        let mut o = order(FulfillmentMethod::Delivery);
        assert!(!o.can_download_receipt());
        o.force_status(OrderStatus::Paid);
        assert!(o.can_download_receipt());
        o.force_status(OrderStatus::Cancelled);
        assert!(!o.can_download_receipt());
    }

    #[test]
    fn test_reorder_only_when_done() {
        let mut o = order(FulfillmentMethod::Delivery);
        assert!(!o.can_reorder());
        o.force_status(OrderStatus::Done);
        assert!(o.can_reorder());
    }
}
