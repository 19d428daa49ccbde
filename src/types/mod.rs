mod price;
mod ws;

pub use price::{EpochResult, Outcome, PricePoint};
pub use ws::{
    EpochEndData, EpochStartData, HeartbeatData, PriceData, ServerMessage, SnapshotData,
    StatusData, TimeData,
};
