//! Address book endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::Address;
use crate::services::addresses::NewAddress;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::{ok, AppState};

#[derive(Debug, Serialize)]
pub struct AddressDto {
    pub id: Uuid,
    pub label: String,
    pub street_address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub delivery_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Address> for AddressDto {
    fn from(a: &Address) -> Self {
        Self {
            id: a.id(),
            label: a.label.clone(),
            street_address: a.street_address.clone(),
            suburb: a.suburb.clone(),
            state: a.state.clone(),
            postcode: a.postcode.clone(),
            country: a.country.clone(),
            delivery_instructions: a.delivery_instructions.clone(),
            created_at: a.created_at(),
        }
    }
}

pub async fn list(State(state): State<AppState>, user: CurrentUser) -> Json<serde_json::Value> {
    let addresses = state.addresses.list(user.id);
    ok(addresses.iter().map(AddressDto::from).collect::<Vec<_>>())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, message = "label required"))]
    pub label: String,
    #[validate(length(min = 1, message = "street address required"))]
    pub street_address: String,
    #[validate(length(min = 1, message = "suburb required"))]
    pub suburb: String,
    #[validate(length(min = 1, message = "state required"))]
    pub state: String,
    #[validate(length(min = 4, max = 4, message = "postcode must be 4 digits"))]
    pub postcode: String,
    #[validate(length(min = 1, message = "country required"))]
    pub country: String,
    pub delivery_instructions: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    req.validate()?;
    let address = state.addresses.create(
        user.id,
        NewAddress {
            label: req.label,
            street_address: req.street_address,
            suburb: req.suburb,
            state: req.state,
            postcode: req.postcode,
            country: req.country,
            delivery_instructions: req.delivery_instructions,
        },
    );
    Ok((StatusCode::CREATED, ok(AddressDto::from(&address))))
}
