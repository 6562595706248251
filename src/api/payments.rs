//! Payment endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::orders::OrderDto;
use super::{ok, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: Uuid,
}

/// Checkout-time entry point: the storefront calls this right after order
/// placement to get a client secret for the payment form.
pub async fn create_intent(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let intent = state.payments.create_intent(user.id, req.order_id)?;
    Ok(ok(intent))
}

/// Same operation addressed by order id, for the order-detail retry flow.
pub async fn order_intent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let intent = state.payments.create_intent(user.id, order_id)?;
    Ok(ok(intent))
}

#[derive(Debug, Deserialize)]
pub struct CompletePaymentRequest {
    pub payment_intent_id: String,
}

pub async fn complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<CompletePaymentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state
        .payments
        .complete(user.id, order_id, &req.payment_intent_id)?;
    Ok(ok(OrderDto::detailed(&order)))
}

#[derive(Debug, Deserialize)]
pub struct FailPaymentRequest {
    pub reason: Option<String>,
}

pub async fn fail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<FailPaymentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let reason = req.reason.as_deref().unwrap_or("payment failed");
    let order = state.payments.fail(user.id, order_id, reason)?;
    Ok(ok(OrderDto::detailed(&order)))
}

pub async fn status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state.payments.status(user.id, order_id)?;
    Ok(ok(view))
}
