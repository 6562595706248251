//! Payment reconciliation
//!
//! Binds a payment-intent lifecycle to an order. The gateway itself is an
//! external collaborator behind [`PaymentGateway`]; this service only cares
//! that the confirmed intent matches the attached one before moving
//! PENDING → PAID. A failed attempt is recorded and the order stays PENDING
//! so the customer can retry with a fresh intent.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderEventType, OrderStatus};
use crate::domain::value_objects::Money;
use crate::error::{EngineError, Result};
use crate::notify::OrderNotifier;
use crate::store::Store;

/// External payment gateway boundary.
pub trait PaymentGateway: Send + Sync {
    fn create_intent(&self, order_number: &str, amount: &Money) -> PaymentIntent;
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Gateway stand-in that mints intent ids locally. Used in development and
/// tests; production wires the real Stripe client here.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineGateway;

impl PaymentGateway for OfflineGateway {
    fn create_intent(&self, _order_number: &str, _amount: &Money) -> PaymentIntent {
        let id = format!("pi_{:016x}", rand::random::<u64>());
        let client_secret = format!("{id}_secret_{:08x}", rand::random::<u32>());
        PaymentIntent { id, client_secret }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct IntentView {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: Money,
    pub order_number: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentStatusView {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub paid: bool,
}

#[derive(Clone)]
pub struct PaymentService {
    store: Store,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn OrderNotifier>,
}

impl PaymentService {
    pub fn new(
        store: Store,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    /// Creates a gateway intent for a PENDING order and attaches it.
    /// A retry after a failed attempt replaces the previous intent.
    pub fn create_intent(&self, user_id: Uuid, order_id: Uuid) -> Result<IntentView> {
        let mut state = self.store.write();
        let order = state.order(order_id).ok_or(EngineError::NotFound)?;
        if order.user_id() != user_id {
            return Err(EngineError::NotFound);
        }
        if order.status() != OrderStatus::Pending {
            return Err(EngineError::InvalidState);
        }
        let intent = self
            .gateway
            .create_intent(order.order_number(), order.total_aud());
        let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
        order.attach_payment_intent(intent.id.clone())?;
        Ok(IntentView {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: order.total_aud().clone(),
            order_number: order.order_number().to_string(),
        })
    }

    /// Confirms a payment against the attached intent and moves the order
    /// to PAID.
    pub fn complete(&self, user_id: Uuid, order_id: Uuid, intent_id: &str) -> Result<Order> {
        let (order, events) = {
            let mut state = self.store.write();
            let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
            if order.user_id() != user_id {
                return Err(EngineError::NotFound);
            }
            order.confirm_payment(intent_id)?;
            let events = order.take_events();
            (order.clone(), events)
        };
        for event in &events {
            self.notifier.publish(event);
        }
        Ok(order)
    }

    /// Records a failed attempt; the order stays PENDING.
    pub fn fail(&self, user_id: Uuid, order_id: Uuid, reason: &str) -> Result<Order> {
        let mut state = self.store.write();
        let order = state.order_mut(order_id).ok_or(EngineError::NotFound)?;
        if order.user_id() != user_id {
            return Err(EngineError::NotFound);
        }
        order.fail_payment(reason)?;
        Ok(order.clone())
    }

    pub fn status(&self, user_id: Uuid, order_id: Uuid) -> Result<PaymentStatusView> {
        let state = self.store.read();
        let order = state.order(order_id).ok_or(EngineError::NotFound)?;
        if order.user_id() != user_id {
            return Err(EngineError::NotFound);
        }
        Ok(PaymentStatusView {
            order_number: order.order_number().to_string(),
            status: order.status(),
            payment_intent_id: order.stripe_payment_intent_id().map(String::from),
            paid: order
                .events()
                .iter()
                .any(|e| e.event_type == OrderEventType::PaymentReceived),
        })
    }
}
