//! In-process broadcast transport
//!
//! The seam a live socket hangs off: a WebSocket session subscribes and
//! forwards events for its user. Lagging or absent receivers never block the
//! publisher.

use tokio::sync::broadcast;

use crate::domain::events::DomainEvent;

use super::OrderNotifier;

pub struct BroadcastNotifier {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl OrderNotifier for BroadcastNotifier {
    fn publish(&self, event: &DomainEvent) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.tx.send(event.clone());
    }
}
