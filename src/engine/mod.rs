mod clock;
mod settlement;

pub use clock::EpochClock;
pub use settlement::{run_rollover_task, EngineSettings, SettlementEngine};
