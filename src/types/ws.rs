use super::{EpochResult, Outcome, PricePoint};
use serde::Serialize;

/// Outgoing WebSocket message to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Point-in-time snapshot sent once on subscriber join.
    Init { data: SnapshotData },
    /// Emitted on each accepted tick.
    Price { data: PriceData },
    /// Fixed sub-second cadence, decoupled from tick arrival.
    Time { data: TimeData },
    /// Emitted on rollover, before the matching `epoch_start`.
    EpochEnd { data: EpochEndData },
    EpochStart { data: EpochStartData },
    /// Low-frequency liveness signal.
    Heartbeat { data: HeartbeatData },
    /// Upstream connectivity transition.
    Status { data: StatusData },
}

/// Snapshot payload for newly joined subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    /// Current price, absent until the first tick is observed.
    pub price: Option<f64>,
    pub epoch: i64,
    pub time_remaining: i64,
    pub reference_price: Option<f64>,
    /// Recent price history, oldest first.
    pub history: Vec<PricePoint>,
    /// Recent settled epochs, oldest first.
    pub epoch_results: Vec<EpochResult>,
    /// Epoch boundary timestamps covering retained history plus upcoming ends.
    pub boundaries: Vec<i64>,
    pub pyth_connected: bool,
}

/// Price update payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub price: f64,
    pub timestamp: i64,
    pub epoch: i64,
    pub time_remaining: i64,
}

/// Clock tick payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeData {
    pub epoch: i64,
    pub time_remaining: i64,
}

/// Epoch settlement payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochEndData {
    /// Index of the epoch that just ended.
    pub epoch: i64,
    /// Settlement price.
    pub price: f64,
    /// Reference price the outcome was computed against (the previous
    /// epoch's settlement price), for chart alignment.
    pub ref_price: Option<f64>,
    /// Index into the snapshot price history of the settlement tick.
    pub history_index: Option<usize>,
    /// `None` only for the first epoch ever settled.
    pub outcome: Option<Outcome>,
    pub boundaries: Vec<i64>,
}

/// New-epoch payload, emitted immediately after `epoch_end`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochStartData {
    pub epoch: i64,
    /// Settlement price of the epoch that just ended.
    pub ref_price: Option<f64>,
    pub time_remaining: i64,
    pub boundaries: Vec<i64>,
}

/// Heartbeat payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatData {
    pub server_time: i64,
    pub subscribers: usize,
}

/// Upstream connectivity payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub pyth_connected: bool,
}
