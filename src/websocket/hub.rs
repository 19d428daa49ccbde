use crate::types::{HeartbeatData, ServerMessage};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-subscriber outbound queue capacity. A subscriber that falls this far
/// behind is dropped rather than allowed to stall the broadcast path.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Fan-out of serialized events to all connected subscribers.
///
/// Each subscriber owns a bounded queue drained by its own send loop, so
/// delivery to a slow or dead connection never blocks delivery to others.
pub struct BroadcastHub {
    subscribers: DashMap<Uuid, mpsc::Sender<String>>,
}

impl BroadcastHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: DashMap::new(),
        })
    }

    /// Register a new subscriber, returning its id and the receiving end of
    /// its outbound queue.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        (id, rx)
    }

    /// Register a new subscriber with a greeting message.
    ///
    /// The greeting is queued before the sender becomes visible to broadcasts,
    /// so it is always the first message the subscriber receives. Returns
    /// `None` if the greeting cannot be serialized.
    pub fn register_with(&self, greeting: &ServerMessage) -> Option<(Uuid, mpsc::Receiver<String>)> {
        let json = serde_json::to_string(greeting).ok()?;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        tx.try_send(json).ok()?;
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        Some((id, rx))
    }

    /// Remove a subscriber. Idempotent.
    pub fn unregister(&self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    /// Deliver a message to every connected subscriber.
    ///
    /// Serializes once; a full or closed queue drops that subscriber only.
    pub fn broadcast(&self, msg: &ServerMessage) {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize broadcast message: {}", e);
                return;
            }
        };

        let mut dropped = Vec::new();
        for entry in self.subscribers.iter() {
            match entry.value().try_send(json.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                    dropped.push(*entry.key());
                }
            }
        }

        for id in dropped {
            self.subscribers.remove(&id);
            warn!(subscriber = %id, "dropping unresponsive subscriber");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Low-frequency heartbeat so subscribers and intermediaries can detect
/// liveness independent of price activity. Exits when `shutdown` flips.
pub async fn run_heartbeat_task(
    hub: Arc<BroadcastHub>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                hub.broadcast(&ServerMessage::Heartbeat {
                    data: HeartbeatData {
                        server_time: chrono::Utc::now().timestamp_millis(),
                        subscribers: hub.subscriber_count(),
                    },
                });
            }
            _ = shutdown.changed() => {
                info!("heartbeat task shutting down");
                break;
            }
        }
    }
}
