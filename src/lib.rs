//! Blueflame: order lifecycle and cart consistency engine
//!
//! Core of a bottled-LPG storefront: the state the UI merely renders.
//!
//! ## Features
//! - Per-user carts with merge semantics and live catalog pricing
//! - Atomic checkout: stock revalidation, price freeze, order creation
//! - Eight-state order lifecycle with pickup/delivery branches
//! - Payment-intent reconciliation (PENDING → PAID)
//! - Append-only per-order audit log, rejected transitions included
//! - Fire-and-forget notification fan-out: NATS, in-process broadcast,
//!   and a polling feed with a `since` cursor

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod services;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{EngineError, Result};
pub use store::Store;
