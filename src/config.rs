use std::env;

/// Pyth BTC/USD price feed, used when no feed is configured.
const DEFAULT_FEED_ID: &str = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Epoch length in milliseconds.
    pub epoch_ms: i64,
    /// Pyth Hermes WebSocket endpoint.
    pub hermes_ws_url: String,
    /// Pyth Hermes REST endpoint (initial price seed).
    pub hermes_http_url: String,
    /// Pyth price feed ID to track (hex, no 0x prefix).
    pub price_feed_id: String,
    /// Number of price points retained for new-subscriber snapshots.
    pub price_history_size: usize,
    /// Number of settled epoch results retained.
    pub result_history_size: usize,
    /// Number of future epoch boundaries included in events.
    pub boundary_count: usize,
    /// Delay between upstream reconnect attempts (seconds).
    pub reconnect_delay_secs: u64,
    /// Rollover poll and `time` broadcast cadence (ms).
    pub tick_interval_ms: u64,
    /// Heartbeat broadcast interval (seconds).
    pub heartbeat_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            epoch_ms: env::var("EPOCH_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(10_000),
            hermes_ws_url: env::var("HERMES_WS_URL")
                .unwrap_or_else(|_| "wss://hermes.pyth.network/ws".to_string()),
            hermes_http_url: env::var("HERMES_HTTP_URL")
                .unwrap_or_else(|_| "https://hermes.pyth.network".to_string()),
            price_feed_id: env::var("PRICE_FEED_ID")
                .unwrap_or_else(|_| DEFAULT_FEED_ID.to_string()),
            price_history_size: env::var("PRICE_HISTORY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(600),
            result_history_size: env::var("RESULT_HISTORY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(50),
            boundary_count: env::var("BOUNDARY_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(6),
            reconnect_delay_secs: env::var("RECONNECT_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            tick_interval_ms: env::var("TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(250),
            heartbeat_secs: env::var("HEARTBEAT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(30),
        }
    }
}
