//! Catalog endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::ProductVariant;
use crate::domain::value_objects::{Money, Sku};

use super::auth::CurrentUser;
use super::error::ApiError;
use super::{ok, ListParams, Paginated, AppState};

#[derive(Debug, Serialize)]
pub struct VariantDto {
    pub id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub title: String,
    pub price_aud: Decimal,
    pub stock_on_hand: u32,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ProductVariant> for VariantDto {
    fn from(v: &ProductVariant) -> Self {
        Self {
            id: v.id(),
            sku: v.sku().to_string(),
            product_name: v.product_name().to_string(),
            title: v.title().to_string(),
            price_aud: v.price().amount(),
            stock_on_hand: v.stock_on_hand(),
            in_stock: v.stock_on_hand() > 0,
            created_at: v.created_at(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<serde_json::Value> {
    let (page, per_page) = params.clamp();
    let (variants, total) = state.catalog.list(page, per_page);
    ok(Paginated {
        data: variants.iter().map(VariantDto::from).collect::<Vec<_>>(),
        total,
        page,
    })
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let variant = state.catalog.get(id)?;
    Ok(ok(VariantDto::from(&variant)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 50, message = "sku must be 1-50 characters"))]
    pub sku: String,
    #[validate(length(min = 1, message = "product name required"))]
    pub product_name: String,
    #[validate(length(min = 1, message = "title required"))]
    pub title: String,
    pub price_aud: Decimal,
    #[serde(default)]
    pub stock_on_hand: u32,
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    user.require_admin()?;
    req.validate()?;
    if req.price_aud <= Decimal::ZERO {
        return Err(ApiError::unprocessable("price must be positive"));
    }
    let sku = Sku::new(&req.sku).map_err(|e| ApiError::unprocessable(e.to_string()))?;
    let variant = state.catalog.create_variant(
        sku,
        req.product_name,
        req.title,
        Money::aud(req.price_aud),
        req.stock_on_hand,
    );
    Ok((StatusCode::CREATED, ok(VariantDto::from(&variant))))
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock_on_hand: u32,
}

pub async fn set_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let variant = state.catalog.set_stock(id, req.stock_on_hand)?;
    Ok(ok(VariantDto::from(&variant)))
}
