//! Order endpoints
//!
//! Action availability (`can_cancel`, `can_download_receipt`, `can_reorder`)
//! is computed here from the order itself; the UI renders what it is told
//! and the engine re-checks on every action anyway.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::order::{
    FulfillmentMethod, Order, OrderEventType, OrderStatus, ShippingAddress,
};

use super::auth::CurrentUser;
use super::error::ApiError;
use super::{ok, ListParams, Paginated, AppState};

#[derive(Debug, Serialize)]
pub struct OrderItemDto {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub is_preorder: bool,
    pub unit_price_aud: Decimal,
    pub total_price_aud: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderEventDto {
    pub event_type: OrderEventType,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub fulfillment_method: FulfillmentMethod,
    pub subtotal_aud: Decimal,
    pub shipping_cost_aud: Decimal,
    pub total_aud: Decimal,
    pub address: Option<ShippingAddress>,
    pub customer_notes: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub pickup_code: Option<String>,
    pub can_cancel: bool,
    pub can_download_receipt: bool,
    pub can_reorder: bool,
    pub items: Vec<OrderItemDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<OrderEventDto>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDto {
    pub fn summary(order: &Order) -> Self {
        Self::build(order, false)
    }

    /// Single-order view, including the audit trail.
    pub fn detailed(order: &Order) -> Self {
        Self::build(order, true)
    }

    fn build(order: &Order, with_events: bool) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            fulfillment_method: order.fulfillment_method(),
            subtotal_aud: order.subtotal_aud().amount(),
            shipping_cost_aud: order.shipping_cost_aud().amount(),
            total_aud: order.total_aud().amount(),
            address: order.address().cloned(),
            customer_notes: order.customer_notes().map(String::from),
            stripe_payment_intent_id: order.stripe_payment_intent_id().map(String::from),
            pickup_code: order.pickup_code().map(String::from),
            can_cancel: order.can_cancel(),
            can_download_receipt: order.can_download_receipt(),
            can_reorder: order.can_reorder(),
            items: order
                .items()
                .iter()
                .map(|i| OrderItemDto {
                    id: i.id,
                    variant_id: i.variant_id,
                    name: i.name.clone(),
                    sku: i.sku.clone(),
                    quantity: i.quantity,
                    is_preorder: i.is_preorder,
                    unit_price_aud: i.unit_price_aud.amount(),
                    total_price_aud: i.total_price_aud.amount(),
                })
                .collect(),
            events: with_events.then(|| {
                order
                    .events()
                    .iter()
                    .map(|e| OrderEventDto {
                        event_type: e.event_type,
                        description: e.description.clone(),
                        metadata: e.metadata.clone(),
                        created_at: e.created_at,
                    })
                    .collect()
            }),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressRequest {
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

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(req: ShippingAddressRequest) -> Self {
        Self {
            label: req.label,
            street_address: req.street_address,
            suburb: req.suburb,
            state: req.state,
            postcode: req.postcode,
            country: req.country,
            delivery_instructions: req.delivery_instructions,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub fulfillment_method: FulfillmentMethod,
    pub address_id: Option<Uuid>,
    #[validate]
    pub shipping_address: Option<ShippingAddressRequest>,
    /// Gateway choice; resolved when the payment intent is created.
    pub payment_method: Option<String>,
    #[validate(length(max = 1000, message = "notes too long"))]
    pub customer_notes: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    req.validate()?;
    let order = state.checkout.create_order(
        user.id,
        req.fulfillment_method,
        req.address_id,
        req.shipping_address.map(Into::into),
        req.customer_notes,
    )?;
    Ok((StatusCode::CREATED, ok(OrderDto::detailed(&order))))
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> Json<serde_json::Value> {
    let (page, per_page) = params.clamp();
    let (orders, total) = state.orders.list(user.id, user.is_admin(), page, per_page);
    ok(Paginated {
        data: orders.iter().map(OrderDto::summary).collect::<Vec<_>>(),
        total,
        page,
    })
}

pub async fn get_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.get(user.id, user.is_admin(), order_id)?;
    Ok(ok(OrderDto::detailed(&order)))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.cancel(user.id, user.is_admin(), order_id)?;
    Ok(ok(OrderDto::detailed(&order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// Status the admin screen was showing; a mismatch is a 409 so a
    /// double-click never applies twice.
    pub expected_status: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let target = OrderStatus::from_str(&req.status)
        .map_err(|_| ApiError::unprocessable(format!("unknown status {}", req.status)))?;
    let expected = req
        .expected_status
        .as_deref()
        .map(OrderStatus::from_str)
        .transpose()
        .map_err(|_| ApiError::unprocessable("unknown expected status"))?;
    let order = state.orders.transition(order_id, target, expected)?;
    Ok(ok(OrderDto::detailed(&order)))
}

pub async fn reorder(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.orders.reorder(user.id, order_id)?;
    Ok(ok(outcome))
}
