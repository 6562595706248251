//! Service layer: each service owns a store handle and runs its whole
//! operation under one guard, which is where the engine's atomicity and
//! compare-and-swap guarantees come from.

pub mod addresses;
pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod shipping;

pub use addresses::AddressService;
pub use carts::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use orders::OrderService;
pub use payments::PaymentService;
