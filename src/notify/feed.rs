//! Polling fallback feed
//!
//! Clients without a live socket poll with a `since` cursor (unix millis) and
//! receive the status updates recorded after it. The feed keeps a bounded
//! in-memory window; a client that falls behind the window simply refetches
//! its order list.

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;
use crate::domain::events::DomainEvent;

use super::OrderNotifier;

const FEED_CAPACITY: usize = 1024;

/// One status change, as returned to polling clients.
#[derive(Clone, Debug, Serialize)]
pub struct OrderUpdate {
    pub order_number: String,
    pub new_status: OrderStatus,
    pub at: i64,
}

struct FeedEntry {
    user_id: Uuid,
    update: OrderUpdate,
}

#[derive(Default)]
pub struct UpdateFeed {
    entries: RwLock<Vec<FeedEntry>>,
}

impl UpdateFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status updates for a user recorded strictly after `since` (unix millis).
    pub fn updates_since(&self, user_id: Uuid, since: i64) -> Vec<OrderUpdate> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.user_id == user_id && e.update.at > since)
            .map(|e| e.update.clone())
            .collect()
    }
}

impl OrderNotifier for UpdateFeed {
    fn publish(&self, event: &DomainEvent) {
        let DomainEvent::OrderStatusChanged {
            user_id,
            order_number,
            new_status,
            occurred_at,
            ..
        } = event
        else {
            return;
        };
        let mut entries = self.entries.write();
        entries.push(FeedEntry {
            user_id: *user_id,
            update: OrderUpdate {
                order_number: order_number.clone(),
                new_status: *new_status,
                at: occurred_at.timestamp_millis(),
            },
        });
        if entries.len() > FEED_CAPACITY {
            let overflow = entries.len() - FEED_CAPACITY;
            entries.drain(..overflow);
        }
    }
}
