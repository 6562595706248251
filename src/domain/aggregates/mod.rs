//! Aggregates module
pub mod address;
pub mod cart;
pub mod order;
pub mod variant;

pub use address::Address;
pub use cart::{Cart, CartItem, QuantityChange};
pub use order::{
    FulfillmentMethod, Order, OrderEvent, OrderEventType, OrderItem, OrderStatus, ShippingAddress,
};
pub use variant::ProductVariant;
