//! Domain notification events
//!
//! Raised by aggregates, drained by the service layer after the store write
//! completes, and fanned out to whichever notification transports are active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::order::OrderStatus;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    #[serde(rename = "order.created")]
    OrderCreated {
        user_id: Uuid,
        order_id: Uuid,
        order_number: String,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "order.status_changed")]
    OrderStatusChanged {
        user_id: Uuid,
        order_id: Uuid,
        order_number: String,
        new_status: OrderStatus,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Owner of the order the event concerns, used for per-user channel routing.
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::OrderCreated { user_id, .. } | Self::OrderStatusChanged { user_id, .. } => {
                *user_id
            }
        }
    }

    pub fn order_number(&self) -> &str {
        match self {
            Self::OrderCreated { order_number, .. }
            | Self::OrderStatusChanged { order_number, .. } => order_number,
        }
    }
}
