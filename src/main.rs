//! Blueflame storefront engine

use std::sync::Arc;

use anyhow::Result;
use blueflame::api::{self, AppState};
use blueflame::notify::{BroadcastNotifier, FanoutNotifier, NatsNotifier, UpdateFeed};
use blueflame::domain::value_objects::Money;
use blueflame::services::payments::OfflineGateway;
use blueflame::services::shipping::FlatRate;
use blueflame::{Config, Store};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store = Store::new();
    let feed = Arc::new(UpdateFeed::new());
    let broadcast = Arc::new(BroadcastNotifier::new(256));

    let mut notifier = FanoutNotifier::new()
        .with(feed.clone())
        .with(broadcast.clone());
    if let Some(url) = &config.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                notifier = notifier.with(Arc::new(NatsNotifier::new(client)));
            }
            Err(e) => tracing::warn!(%url, error = %e, "NATS unavailable, continuing without it"),
        }
    }

    let state = AppState::new(
        store,
        Arc::new(FlatRate::new(Money::aud(config.delivery_flat_rate_aud))),
        Arc::new(OfflineGateway),
        Arc::new(notifier),
        feed,
    );

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("🚀 Blueflame storefront engine listening on 0.0.0.0:{}", config.port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?,
        app,
    )
    .await?;
    Ok(())
}
