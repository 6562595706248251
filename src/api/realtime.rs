//! Polling fallback for clients without a live socket
//!
//! `GET /web/realtime/customer-orders?since=<unix_millis>` returns the
//! status updates recorded after the cursor plus a small stats block the
//! dashboard renders. Clients poll with the returned `timestamp` as their
//! next cursor.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

use super::auth::CurrentUser;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub since: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
pub struct FeedStats {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
}

fn stats_for(state: &AppState, user_id: Uuid) -> FeedStats {
    let store = state.store.read();
    let mut stats = FeedStats::default();
    for order in store.orders_for(user_id) {
        match order.status() {
            OrderStatus::Pending => stats.pending += 1,
            OrderStatus::Done => stats.completed += 1,
            OrderStatus::Cancelled => stats.cancelled += 1,
            _ => stats.active += 1,
        }
    }
    stats
}

pub async fn customer_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<FeedParams>,
) -> Json<serde_json::Value> {
    let since = params.since.unwrap_or(0);
    let updates = state.feed.updates_since(user.id, since);
    Json(json!({
        "success": true,
        "timestamp": Utc::now().timestamp_millis(),
        "updates": updates,
        "stats": stats_for(&state, user.id),
    }))
}
