use crate::engine::SettlementEngine;
use crate::error::{AppError, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Hermes WebSocket subscription request.
#[derive(Debug, Serialize)]
struct SubscribeRequest {
    #[serde(rename = "type")]
    msg_type: String,
    ids: Vec<String>,
    verbose: bool,
    binary: bool,
}

/// Hermes stream frame. Non-price frames (subscription acks) carry no feed.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(rename = "type")]
    msg_type: String,
    price_feed: Option<PriceFeed>,
}

#[derive(Debug, Deserialize)]
struct PriceFeed {
    id: String,
    price: FeedPrice,
}

/// Pyth price encoding: integer mantissa scaled by a base-10 exponent.
#[derive(Debug, Deserialize)]
struct FeedPrice {
    price: String,
    expo: i32,
    publish_time: i64,
}

impl FeedPrice {
    /// Normalize to an f64 price and a millisecond publish time.
    fn normalize(&self) -> Option<(f64, i64)> {
        let mantissa: i64 = self.price.parse().ok()?;
        let price = mantissa as f64 * 10f64.powi(self.expo);
        Some((price, self.publish_time * 1000))
    }
}

/// Hermes REST response for the initial price seed.
#[derive(Debug, Deserialize)]
struct LatestFeed {
    price: FeedPrice,
}

/// Pyth Hermes WebSocket tick source.
///
/// Connects to the upstream feed, normalizes each update into a
/// `(price, observed_at)` pair for the settlement engine, and reconnects with
/// a fixed delay on failure. Only ever calls into the engine; never reads
/// epoch state.
pub struct PythWs {
    ws_url: String,
    feed_id: String,
    engine: Arc<SettlementEngine>,
    reconnect_delay: Duration,
}

impl PythWs {
    pub fn new(
        ws_url: String,
        feed_id: String,
        engine: Arc<SettlementEngine>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            ws_url,
            feed_id,
            engine,
            reconnect_delay,
        }
    }

    /// Connect and stream ticks forever, reconnecting on any failure.
    pub async fn connect(&self) {
        loop {
            match self.run_connection().await {
                Ok(()) => warn!("Hermes WebSocket disconnected, reconnecting..."),
                Err(e) => error!("Hermes WebSocket error: {}, reconnecting...", e),
            }
            self.engine.set_upstream_connected(false);
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn run_connection(&self) -> anyhow::Result<()> {
        info!("Connecting to Hermes at {}", self.ws_url);
        let (ws_stream, _) = connect_async(self.ws_url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe = SubscribeRequest {
            msg_type: "subscribe".to_string(),
            ids: vec![self.feed_id.clone()],
            verbose: false,
            binary: false,
        };
        write
            .send(Message::Text(serde_json::to_string(&subscribe)?))
            .await?;
        info!("Subscribed to Pyth feed {}", self.feed_id);
        self.engine.set_upstream_connected(true);

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => self.handle_frame(&text),
                Ok(Message::Ping(data)) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => {
                    info!("Hermes WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("Hermes WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_frame(&self, text: &str) {
        let frame: StreamFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping malformed Hermes frame: {}", e);
                return;
            }
        };

        if frame.msg_type != "price_update" {
            debug!("Hermes {} frame", frame.msg_type);
            return;
        }

        let Some(feed) = frame.price_feed else {
            warn!("price_update frame without a price feed");
            return;
        };
        if feed.id.trim_start_matches("0x") != self.feed_id.trim_start_matches("0x") {
            return;
        }

        match feed.price.normalize() {
            Some((price, publish_ms)) => self.engine.on_tick(price, publish_ms),
            None => warn!("unparseable price mantissa: {}", feed.price.price),
        }
    }
}

/// Fetch the latest published price over REST, used once at startup so early
/// joiners see a price before the stream delivers its first tick.
pub async fn fetch_initial_price(http_url: &str, feed_id: &str) -> Result<(f64, i64)> {
    let url = format!("{}/api/latest_price_feeds?ids[]={}", http_url, feed_id);
    let feeds: Vec<LatestFeed> = reqwest::get(&url).await?.json().await?;
    feeds
        .first()
        .and_then(|f| f.price.normalize())
        .ok_or_else(|| AppError::Upstream("no price in Hermes response".to_string()))
}
