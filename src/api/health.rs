use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// Read-only liveness/introspection payload. No side effects.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    pyth_connected: bool,
    price: Option<f64>,
    epoch: i64,
    time_remaining: i64,
    subscribers: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = chrono::Utc::now().timestamp_millis();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pyth_connected: state.engine.upstream_connected(),
        price: state.engine.current_price(),
        epoch: state.engine.current_epoch(),
        time_remaining: state.engine.clock().time_remaining(now),
        subscribers: state.hub.subscriber_count(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            pyth_connected: true,
            price: Some(68000.0),
            epoch: 170406720,
            time_remaining: 4300,
            subscribers: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"pythConnected\":true"));
        assert!(json.contains("\"timeRemaining\":4300"));
        assert!(json.contains("\"subscribers\":3"));
    }

    #[test]
    fn test_health_response_before_first_tick() {
        let response = HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            pyth_connected: false,
            price: None,
            epoch: 0,
            time_remaining: 10_000,
            subscribers: 0,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"price\":null"));
        assert!(json.contains("\"pythConnected\":false"));
    }
}
