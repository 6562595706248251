//! Shipping rate collaborator
//!
//! Delivery pricing belongs to the carrier integration, not this engine; the
//! engine only asks for a rate at checkout. Pickup orders never get here.

use rust_decimal::Decimal;

use crate::domain::aggregates::ShippingAddress;
use crate::domain::value_objects::Money;

pub trait ShippingRateProvider: Send + Sync {
    fn delivery_rate(&self, address: &ShippingAddress, subtotal: &Money) -> Money;
}

/// Flat-rate stand-in used until a carrier integration is wired up.
pub struct FlatRate {
    rate: Money,
}

impl FlatRate {
    pub fn new(rate: Money) -> Self {
        Self { rate }
    }

    pub fn aud(amount: Decimal) -> Self {
        Self::new(Money::aud(amount))
    }
}

impl ShippingRateProvider for FlatRate {
    fn delivery_rate(&self, _address: &ShippingAddress, _subtotal: &Money) -> Money {
        self.rate.clone()
    }
}
