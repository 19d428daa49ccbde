//! Updown - real-time up/down price prediction relay
//!
//! A relay server that ingests the Pyth price feed, segments wall-clock time
//! into fixed-length epochs, settles a binary up/down outcome at each epoch
//! boundary, and broadcasts state transitions to WebSocket subscribers.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod sources;
pub mod types;
pub mod websocket;

use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub engine: Arc<engine::SettlementEngine>,
    pub hub: Arc<websocket::BroadcastHub>,
}

// Re-export commonly used types
pub use types::*;
