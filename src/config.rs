//! Environment-driven configuration

use rust_decimal::Decimal;

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// NATS server URL; notifications over NATS are skipped when unset.
    pub nats_url: Option<String>,
    /// Flat delivery rate in AUD charged by the stand-in shipping collaborator.
    pub delivery_flat_rate_aud: Decimal,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8083);
        let nats_url = std::env::var("NATS_URL").ok();
        let delivery_flat_rate_aud = std::env::var("DELIVERY_FLAT_RATE_AUD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| Decimal::new(995, 2));
        Self {
            port,
            nats_url,
            delivery_flat_rate_aud,
        }
    }
}
