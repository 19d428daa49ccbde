use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::types::ServerMessage;
use crate::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Queue the snapshot before the subscriber is visible to broadcasts, so
    // `init` is guaranteed to be the first message it sees even while the
    // rollover task fires concurrently.
    let now = chrono::Utc::now().timestamp_millis();
    let init = ServerMessage::Init {
        data: state.engine.snapshot(now),
    };
    let Some((client_id, mut rx)) = state.hub.register_with(&init) else {
        return;
    };
    info!("subscriber connected: {}", client_id);

    // Dedicated send loop draining this subscriber's queue into the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Subscribers own no game state and there is a single instrument, so
    // inbound frames only matter for connection lifecycle.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                info!("subscriber disconnecting: {}", client_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
                debug!("ping from {}", client_id);
            }
            Ok(Message::Text(text)) => {
                debug!("ignoring message from {}: {}", client_id, text);
            }
            Err(e) => {
                error!("websocket error for {}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    state.hub.unregister(client_id);
    send_task.abort();
    info!("subscriber disconnected: {}", client_id);
}
