//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use sabun_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::http::{SessionSummaryDto, WaitingRoomDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of active sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummaryDto>> {
    let mut summaries = Vec::new();
    for shared in state.sessions.list().await {
        let session = shared.lock().await;
        let session_state = session.state();
        summaries.push(SessionSummaryDto {
            session_id: session_state.session_id().value(),
            mode: if session.is_limited_time() {
                "limited-time".to_string()
            } else {
                "classic".to_string()
            },
            game_id: session_state.game_id().to_string(),
            players: session_state
                .client_ids()
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
            elapsed: session_state.elapsed(),
        });
    }

    // Sort by session_id for consistent ordering
    summaries.sort_by_key(|s| s.session_id);
    Json(summaries)
}

/// Get list of matchmaking rooms waiting for an opponent
pub async fn list_waiting_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<WaitingRoomDto>> {
    let rooms = state.matchmaking.waiting_rooms().await;
    Json(
        rooms
            .into_iter()
            .map(|room| WaitingRoomDto {
                id: room.id.to_string(),
                game_id: room.game_id().to_string(),
                host: room.host.client_id.into_string(),
                created_at: timestamp_to_jst_rfc3339(room.id.created_at().value()),
            })
            .collect(),
    )
}
