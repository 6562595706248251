//! NATS notification transport
//!
//! Customers listen on `user.{id}.orders` for `order.status_changed`;
//! the merchant dashboard listens on `admin-orders` for `order.created`.

use serde_json::json;

use crate::domain::events::DomainEvent;

use super::OrderNotifier;

pub struct NatsNotifier {
    client: async_nats::Client,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

impl OrderNotifier for NatsNotifier {
    fn publish(&self, event: &DomainEvent) {
        let (subject, payload) = match event {
            DomainEvent::OrderCreated {
                order_number,
                occurred_at,
                ..
            } => (
                "admin-orders".to_string(),
                json!({
                    "event": "order.created",
                    "order_number": order_number,
                    "occurred_at": occurred_at,
                }),
            ),
            DomainEvent::OrderStatusChanged {
                user_id,
                order_number,
                new_status,
                occurred_at,
                ..
            } => (
                format!("user.{user_id}.orders"),
                json!({
                    "event": "order.status_changed",
                    "order_number": order_number,
                    "new_status": new_status,
                    "occurred_at": occurred_at,
                }),
            ),
        };
        let client = self.client.clone();
        let body = payload.to_string();
        tokio::spawn(async move {
            if let Err(e) = client.publish(subject.clone(), body.into()).await {
                tracing::warn!(%subject, error = %e, "order notification publish failed");
            }
        });
    }
}
