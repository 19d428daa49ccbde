use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use updown::config::Config;
use updown::engine::{run_rollover_task, EngineSettings, SettlementEngine};
use updown::sources::{fetch_initial_price, PythWs};
use updown::websocket::{run_heartbeat_task, ws_handler, BroadcastHub};
use updown::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "updown=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting updown relay on {}:{}", config.host, config.port);

    let hub = BroadcastHub::new();
    let engine = SettlementEngine::new(
        hub.clone(),
        EngineSettings {
            epoch_ms: config.epoch_ms,
            price_history_size: config.price_history_size,
            result_history_size: config.result_history_size,
            boundary_count: config.boundary_count,
        },
        chrono::Utc::now().timestamp_millis(),
    );

    // Seed the engine with the latest published price so early joiners see a
    // price before the stream delivers its first tick.
    match fetch_initial_price(&config.hermes_http_url, &config.price_feed_id).await {
        Ok((price, publish_ms)) => engine.on_tick(price, publish_ms),
        Err(e) => warn!("could not seed initial price: {}", e),
    }

    // Start the upstream tick source
    let pyth = PythWs::new(
        config.hermes_ws_url.clone(),
        config.price_feed_id.clone(),
        engine.clone(),
        Duration::from_secs(config.reconnect_delay_secs),
    );
    tokio::spawn(async move { pyth.connect().await });

    // Scheduled tasks with a shutdown hook
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(run_rollover_task(
        engine.clone(),
        hub.clone(),
        config.tick_interval_ms,
        shutdown_rx.clone(),
    ));
    tokio::spawn(run_heartbeat_task(
        hub.clone(),
        config.heartbeat_secs,
        shutdown_rx,
    ));

    let state = AppState {
        config: config.clone(),
        engine,
        hub,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Failure to bind is the only fatal startup condition.
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("updown relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}
