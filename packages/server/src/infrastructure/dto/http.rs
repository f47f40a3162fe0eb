//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Active session summary for the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummaryDto {
    pub session_id: u32,
    /// "classic" or "limited-time"
    pub mode: String,
    pub game_id: String,
    pub players: Vec<String>,
    pub elapsed: u64,
}

/// Pending matchmaking room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingRoomDto {
    pub id: String,
    pub game_id: String,
    pub host: String,
    pub created_at: String, // ISO 8601
}
