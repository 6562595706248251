//! Notification fan-out
//!
//! The engine is transport-agnostic: on every successful transition the
//! service layer hands the raised [`DomainEvent`]s to an [`OrderNotifier`],
//! and whichever transports are active (NATS, in-process broadcast, the
//! polling feed) pick them up. Emission is fire-and-forget: a transport
//! failure is logged and never rolls back the state change that already
//! happened.

pub mod broadcast;
pub mod feed;
pub mod nats;

use std::sync::Arc;

use crate::domain::events::DomainEvent;

pub use broadcast::BroadcastNotifier;
pub use feed::{OrderUpdate, UpdateFeed};
pub use nats::NatsNotifier;

pub trait OrderNotifier: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

/// Delivers each event to every configured transport.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn OrderNotifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn OrderNotifier>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl OrderNotifier for FanoutNotifier {
    fn publish(&self, event: &DomainEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

/// Discards every event. Used in tests and when no transport is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl OrderNotifier for NullNotifier {
    fn publish(&self, _event: &DomainEvent) {}
}
