mod handler;
mod hub;

pub use handler::ws_handler;
pub use hub::{run_heartbeat_task, BroadcastHub};
