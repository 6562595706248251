//! Cart endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::services::carts::CartLineView;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::{ok, AppState};

#[derive(Debug, Serialize)]
pub struct CartItemDto {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub title: String,
    pub sku: String,
    pub quantity: u32,
    pub is_preorder: bool,
    pub notes: Option<String>,
    pub unit_price_aud: Decimal,
    pub line_total_aud: Decimal,
}

impl From<CartLineView> for CartItemDto {
    fn from(view: CartLineView) -> Self {
        Self {
            id: view.id,
            variant_id: view.variant_id,
            product_name: view.product_name,
            title: view.title,
            sku: view.sku,
            quantity: view.quantity,
            is_preorder: view.is_preorder,
            notes: view.notes,
            unit_price_aud: view.unit_price.amount(),
            line_total_aud: view.line_total.amount(),
        }
    }
}

pub async fn get_cart(State(state): State<AppState>, user: CurrentUser) -> Json<serde_json::Value> {
    let cart = state.carts.get_cart(user.id);
    let items: Vec<CartItemDto> = cart.items.into_iter().map(Into::into).collect();
    ok(json!({
        "items": items,
        "total": cart.subtotal.amount(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemRequest {
    pub product_variant_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default)]
    pub is_preorder: bool,
    #[validate(length(max = 500, message = "notes too long"))]
    pub notes: Option<String>,
}

pub async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    req.validate()?;
    let line = state.carts.add_item(
        user.id,
        req.product_variant_id,
        req.quantity,
        req.is_preorder,
        req.notes,
    )?;
    Ok((StatusCode::CREATED, ok(CartItemDto::from(line))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.carts.update_quantity(user.id, item_id, req.quantity)?;
    Ok(ok(updated.map(CartItemDto::from)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.carts.remove_item(user.id, item_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(State(state): State<AppState>, user: CurrentUser) -> StatusCode {
    state.carts.clear(user.id);
    StatusCode::NO_CONTENT
}
