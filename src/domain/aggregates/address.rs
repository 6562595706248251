//! Address aggregate
//!
//! Saved delivery addresses belong to a user. Orders copy the address at
//! checkout rather than referencing it, so editing the address book never
//! rewrites order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::ShippingAddress;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Address {
    id: Uuid,
    user_id: Uuid,
    pub label: String,
    pub street_address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub delivery_instructions: Option<String>,
    created_at: DateTime<Utc>,
}

impl Address {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        user_id: Uuid,
        label: impl Into<String>,
        street_address: impl Into<String>,
        suburb: impl Into<String>,
        state: impl Into<String>,
        postcode: impl Into<String>,
        country: impl Into<String>,
        delivery_instructions: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            label: label.into(),
            street_address: street_address.into(),
            suburb: suburb.into(),
            state: state.into(),
            postcode: postcode.into(),
            country: country.into(),
            delivery_instructions,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Snapshot copied onto a delivery order.
    pub fn to_shipping(&self) -> ShippingAddress {
        ShippingAddress {
            label: self.label.clone(),
            street_address: self.street_address.clone(),
            suburb: self.suburb.clone(),
            state: self.state.clone(),
            postcode: self.postcode.clone(),
            country: self.country.clone(),
            delivery_instructions: self.delivery_instructions.clone(),
        }
    }
}
