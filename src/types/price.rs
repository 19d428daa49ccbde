use serde::{Deserialize, Serialize};

/// Direction of a settled epoch relative to its reference price.
///
/// A tie settles as `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Up,
    Down,
}

/// A single normalized price observation from the upstream feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    /// Publish time reported upstream, Unix milliseconds.
    pub timestamp: i64,
    /// Epoch index the tick was observed in.
    pub epoch: i64,
}

/// The settled result of one epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochResult {
    pub epoch: i64,
    /// First price observed in the epoch (carried forward across rollovers).
    pub start_price: f64,
    /// Settlement price: last tick observed in the epoch, or the last known
    /// price when the epoch saw no ticks.
    pub end_price: f64,
    /// `None` only for the first epoch ever settled.
    pub outcome: Option<Outcome>,
    /// Epoch-end boundary timestamp, Unix milliseconds.
    pub timestamp: i64,
}
