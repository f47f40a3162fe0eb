//! Server bootstrap: router, listener and graceful shutdown.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::DifferenceRepository,
    infrastructure::repository::JsonDifferenceRepository,
    ui::{
        handler::{health_check, list_sessions, list_waiting_rooms, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

/// Build the HTTP + WebSocket router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/sessions", get(list_sessions))
        .route("/api/waiting-rooms", get(list_waiting_rooms))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the game server until Ctrl-C or SIGTERM.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let differences = Arc::new(JsonDifferenceRepository::new(&config.data_dir));
    match differences.list_games().await {
        Ok(games) => tracing::info!(
            "{} game(s) available in {}",
            games.len(),
            config.data_dir.display()
        ),
        Err(e) => tracing::warn!("Cannot list games in {}: {}", config.data_dir.display(), e),
    }

    let state = Arc::new(AppState::new(differences, config.constants()));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let shutdown_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // stop every clock and drop client channels so sockets close
            shutdown_state.sessions.clear().await;
            shutdown_state.connected_clients.lock().await.clear();
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
