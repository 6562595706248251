//! Engine error types

use thiserror::Error;

use crate::domain::aggregates::order::OrderStatus;

/// Errors raised by cart, checkout, order, and payment operations.
///
/// Every variant is a per-request business rejection; nothing here is fatal
/// to the process. The HTTP layer maps these onto status codes in
/// `api::error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("insufficient stock for {variant}")]
    OutOfStock { variant: String },

    #[error("cart is empty")]
    EmptyCart,

    #[error("a delivery address is required")]
    AddressRequired,

    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("operation is not allowed in the order's current state")]
    InvalidState,

    #[error("payment intent does not match this order")]
    IntentMismatch,

    #[error("order was modified by another request")]
    StaleState,

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,
}

pub type Result<T> = std::result::Result<T, EngineError>;
