//! Epoch settlement engine.
//!
//! Tracks live price ticks, detects epoch boundary crossings on a wall-clock
//! grid, computes the up/down outcome of each ended epoch against the previous
//! settlement price, and publishes state transitions to the broadcast hub.
//!
//! All state lives behind one mutex and every mutation happens on a single
//! sequential control path (tick ingestion and rollover checks both take the
//! lock), which is what makes settlement exactly-once per epoch index. Events
//! are published while the lock is held so subscribers observe transitions in
//! order and a snapshot can never interleave with an in-flight settlement.

use crate::engine::EpochClock;
use crate::types::{
    EpochEndData, EpochResult, EpochStartData, Outcome, PriceData, PricePoint, ServerMessage,
    SnapshotData, StatusData, TimeData,
};
use crate::websocket::BroadcastHub;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Engine tuning knobs, split out from the full server `Config` so tests can
/// construct an engine directly.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Epoch length in milliseconds.
    pub epoch_ms: i64,
    /// Price points retained for snapshots.
    pub price_history_size: usize,
    /// Settled results retained for snapshots.
    pub result_history_size: usize,
    /// Future boundary timestamps included in events.
    pub boundary_count: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            epoch_ms: 10_000,
            price_history_size: 600,
            result_history_size: 50,
            boundary_count: 6,
        }
    }
}

struct EngineState {
    current_epoch: i64,
    /// First price observed in the current epoch (carried forward on rollover).
    epoch_start_price: Option<f64>,
    /// Most recent tick observed in the current epoch; the settlement candidate.
    last_tick_price: Option<f64>,
    /// Settlement price of the previous epoch.
    reference_price: Option<f64>,
    /// Last accepted tick price, regardless of epoch.
    current_price: Option<f64>,
    history: VecDeque<PricePoint>,
    results: VecDeque<EpochResult>,
    pyth_connected: bool,
}

/// Single-writer settlement state machine.
pub struct SettlementEngine {
    hub: Arc<BroadcastHub>,
    clock: EpochClock,
    settings: EngineSettings,
    state: Mutex<EngineState>,
}

impl SettlementEngine {
    /// Create an engine whose current epoch contains `now_ms`.
    pub fn new(hub: Arc<BroadcastHub>, settings: EngineSettings, now_ms: i64) -> Arc<Self> {
        let clock = EpochClock::new(settings.epoch_ms);
        let state = EngineState {
            current_epoch: clock.epoch_index(now_ms),
            epoch_start_price: None,
            last_tick_price: None,
            reference_price: None,
            current_price: None,
            history: VecDeque::with_capacity(settings.price_history_size),
            results: VecDeque::with_capacity(settings.result_history_size),
            pyth_connected: false,
        };
        info!(
            epoch = state.current_epoch,
            epoch_ms = settings.epoch_ms,
            "settlement engine initialized"
        );
        Arc::new(Self {
            hub,
            clock,
            settings,
            state: Mutex::new(state),
        })
    }

    pub fn clock(&self) -> &EpochClock {
        &self.clock
    }

    /// Ingest one tick from the upstream feed.
    ///
    /// Non-finite or non-positive prices are dropped with a logged warning and
    /// leave state untouched. Never triggers a rollover.
    pub fn on_tick(&self, price: f64, observed_at: i64) {
        if !price.is_finite() || price <= 0.0 {
            warn!(price, observed_at, "rejecting invalid tick");
            return;
        }

        let mut state = self.lock_state();
        state.current_price = Some(price);
        state.last_tick_price = Some(price);
        if state.epoch_start_price.is_none() {
            state.epoch_start_price = Some(price);
        }

        let epoch = state.current_epoch;
        state.history.push_back(PricePoint {
            price,
            timestamp: observed_at,
            epoch,
        });
        while state.history.len() > self.settings.price_history_size {
            state.history.pop_front();
        }

        self.hub.broadcast(&ServerMessage::Price {
            data: PriceData {
                price,
                timestamp: observed_at,
                epoch,
                time_remaining: self.clock.time_remaining(observed_at),
            },
        });
    }

    /// Detect and perform rollovers.
    ///
    /// Settles exactly once per crossed boundary. When the process was stalled
    /// across several boundaries, each missed epoch is settled in order with
    /// the same reference-chaining rule, using the last known price, so the
    /// epoch index always reaches the true wall-clock epoch.
    pub fn check_rollover(&self, now_ms: i64) {
        let target = self.clock.epoch_index(now_ms);
        let mut state = self.lock_state();
        while state.current_epoch < target {
            self.settle_one(&mut state, now_ms);
        }
    }

    /// Settle the current epoch and advance state by one.
    fn settle_one(&self, state: &mut EngineState, now_ms: i64) {
        let ending = state.current_epoch;
        let prev_reference = state.reference_price;
        let settlement = state.last_tick_price.or(state.current_price);

        match settlement {
            Some(end_price) => {
                let outcome = prev_reference.map(|reference| {
                    if end_price > reference {
                        Outcome::Up
                    } else {
                        Outcome::Down
                    }
                });

                let result = EpochResult {
                    epoch: ending,
                    start_price: state.epoch_start_price.unwrap_or(end_price),
                    end_price,
                    outcome,
                    timestamp: self.clock.epoch_end(ending),
                };
                state.results.push_back(result);
                while state.results.len() > self.settings.result_history_size {
                    state.results.pop_front();
                }

                // The settlement price is always the most recent accepted
                // tick, which sits at the back of the retained history.
                let history_index = state.history.len().checked_sub(1);

                debug!(epoch = ending, end_price, ?outcome, "epoch settled");
                self.hub.broadcast(&ServerMessage::EpochEnd {
                    data: EpochEndData {
                        epoch: ending,
                        price: end_price,
                        ref_price: prev_reference,
                        history_index,
                        outcome,
                        boundaries: self.boundaries(state, now_ms),
                    },
                });

                state.reference_price = Some(end_price);
            }
            None => {
                // No price ever observed: advance the index without
                // fabricating a result.
                debug!(epoch = ending, "no price observed, skipping settlement");
            }
        }

        state.current_epoch = ending + 1;
        state.epoch_start_price = state.current_price;
        state.last_tick_price = None;

        // During multi-epoch catch-up the started epoch may itself already be
        // over; clamp so it reports as closed rather than borrowing the final
        // epoch's remaining time.
        let time_remaining = (self.clock.epoch_end(state.current_epoch) - now_ms).max(0);
        self.hub.broadcast(&ServerMessage::EpochStart {
            data: EpochStartData {
                epoch: state.current_epoch,
                ref_price: state.reference_price,
                time_remaining,
                boundaries: self.boundaries(state, now_ms),
            },
        });
    }

    /// One consistent read of the full state for a joining subscriber.
    pub fn snapshot(&self, now_ms: i64) -> SnapshotData {
        let state = self.lock_state();
        SnapshotData {
            price: state.current_price,
            epoch: state.current_epoch,
            time_remaining: self.clock.time_remaining(now_ms),
            reference_price: state.reference_price,
            history: state.history.iter().copied().collect(),
            epoch_results: state.results.iter().copied().collect(),
            boundaries: self.boundaries(&state, now_ms),
            pyth_connected: state.pyth_connected,
        }
    }

    /// Current epoch index and time remaining, for the `time` broadcast.
    pub fn time_data(&self, now_ms: i64) -> TimeData {
        let state = self.lock_state();
        TimeData {
            epoch: state.current_epoch,
            time_remaining: self.clock.time_remaining(now_ms),
        }
    }

    /// Record upstream connectivity; broadcasts `status` on transitions only.
    pub fn set_upstream_connected(&self, connected: bool) {
        let mut state = self.lock_state();
        if state.pyth_connected == connected {
            return;
        }
        state.pyth_connected = connected;
        info!(connected, "upstream connectivity changed");
        self.hub.broadcast(&ServerMessage::Status {
            data: StatusData {
                pyth_connected: connected,
            },
        });
    }

    pub fn upstream_connected(&self) -> bool {
        self.lock_state().pyth_connected
    }

    pub fn current_epoch(&self) -> i64 {
        self.lock_state().current_epoch
    }

    pub fn current_price(&self) -> Option<f64> {
        self.lock_state().current_price
    }

    fn boundaries(&self, state: &EngineState, now_ms: i64) -> Vec<i64> {
        let oldest = state.history.front().map(|p| p.timestamp);
        self.clock
            .boundaries(now_ms, oldest, self.settings.boundary_count)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        // A poisoned lock means a panic mid-mutation; state is forward-only
        // so the latest values are still the best available.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Rollover poll loop: fires on a fixed sub-second interval independent of
/// tick arrival so epochs close on schedule during upstream silence, and
/// broadcasts the `time` event each firing. Exits when `shutdown` flips.
pub async fn run_rollover_task(
    engine: Arc<SettlementEngine>,
    hub: Arc<BroadcastHub>,
    interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = chrono::Utc::now().timestamp_millis();
                engine.check_rollover(now);
                hub.broadcast(&ServerMessage::Time {
                    data: engine.time_data(now),
                });
            }
            _ = shutdown.changed() => {
                info!("rollover task shutting down");
                break;
            }
        }
    }
}
