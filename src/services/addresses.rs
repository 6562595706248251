//! Saved delivery addresses

use uuid::Uuid;

use crate::domain::aggregates::Address;
use crate::store::Store;

#[derive(Clone)]
pub struct AddressService {
    store: Store,
}

pub struct NewAddress {
    pub label: String,
    pub street_address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub delivery_instructions: Option<String>,
}

impl AddressService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: Uuid, input: NewAddress) -> Address {
        let address = Address::create(
            user_id,
            input.label,
            input.street_address,
            input.suburb,
            input.state,
            input.postcode,
            input.country,
            input.delivery_instructions,
        );
        self.store.write().insert_address(address.clone());
        address
    }

    pub fn list(&self, user_id: Uuid) -> Vec<Address> {
        self.store
            .read()
            .addresses_for(user_id)
            .into_iter()
            .cloned()
            .collect()
    }
}
