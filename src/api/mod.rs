//! REST boundary
//!
//! Wire contract: every endpoint answers `{"success": true, "data": ...}`
//! (the realtime feed carries its own envelope), 422s for business
//! rejections, 409s for concurrency losses, and 404 for anything the caller
//! is not allowed to know exists.

pub mod addresses;
pub mod auth;
pub mod carts;
pub mod error;
pub mod orders;
pub mod payments;
pub mod products;
pub mod realtime;

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::notify::{OrderNotifier, UpdateFeed};
use crate::services::payments::PaymentGateway;
use crate::services::shipping::ShippingRateProvider;
use crate::services::{
    AddressService, CartService, CatalogService, CheckoutService, OrderService, PaymentService,
};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub catalog: CatalogService,
    pub addresses: AddressService,
    pub feed: Arc<UpdateFeed>,
}

impl AppState {
    pub fn new(
        store: Store,
        shipping: Arc<dyn ShippingRateProvider>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
        feed: Arc<UpdateFeed>,
    ) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone(), shipping, notifier.clone()),
            orders: OrderService::new(store.clone(), notifier.clone()),
            payments: PaymentService::new(store.clone(), gateway, notifier),
            catalog: CatalogService::new(store.clone()),
            addresses: AddressService::new(store.clone()),
            feed,
            store,
        }
    }
}

/// Success envelope.
pub(crate) fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn clamp(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(1).max(1),
            self.per_page.unwrap_or(20).min(100),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(json!({"status": "healthy", "service": "blueflame"})) }),
        )
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/:id", get(products::get_one))
        .route("/api/products/:id/stock", put(products::set_stock))
        .route(
            "/api/cart",
            get(carts::get_cart)
                .post(carts::add_item)
                .delete(carts::clear_cart),
        )
        .route(
            "/api/cart/:id",
            put(carts::update_item).delete(carts::remove_item),
        )
        .route("/api/orders", get(orders::list).post(orders::create))
        .route(
            "/api/orders/:id",
            get(orders::get_one).put(orders::update_status),
        )
        .route("/api/orders/:id/cancel", patch(orders::cancel))
        .route("/api/orders/:id/reorder", post(orders::reorder))
        .route(
            "/api/checkout/create-payment-intent",
            post(payments::create_intent),
        )
        .route("/api/payments/orders/:id/intent", post(payments::order_intent))
        .route(
            "/api/payments/orders/:id/complete",
            post(payments::complete),
        )
        .route("/api/payments/orders/:id/fail", post(payments::fail))
        .route("/api/payments/orders/:id/status", get(payments::status))
        .route(
            "/api/addresses",
            get(addresses::list).post(addresses::create),
        )
        .route(
            "/web/realtime/customer-orders",
            get(realtime::customer_orders),
        )
        .with_state(state)
}
