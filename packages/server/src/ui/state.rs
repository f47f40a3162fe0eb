//! Server state and connection management.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ClientId, DifferenceRepository, GameConstants, MatchmakingRepository, PlayerName,
        SessionRepository,
    },
    infrastructure::{
        dto::websocket::ServerEvent,
        repository::{InMemoryMatchmakingRepository, InMemorySessionRepository},
    },
};

/// Client connection information
pub struct ClientInfo {
    /// Message sender channel
    pub sender: mpsc::UnboundedSender<String>,
    /// Unix timestamp when connected (in JST, milliseconds)
    pub connected_at: i64,
    /// Set by `provide-name` or `join-room`
    pub name: Option<PlayerName>,
}

/// Shared application state
pub struct AppState {
    pub sessions: Arc<dyn SessionRepository>,
    pub differences: Arc<dyn DifferenceRepository>,
    pub matchmaking: Arc<dyn MatchmakingRepository>,
    /// WebSocket sender channels of every connected client
    pub connected_clients: Mutex<HashMap<ClientId, ClientInfo>>,
    pub constants: GameConstants,
}

impl AppState {
    /// State with in-memory sessions and rooms over `differences`.
    pub fn new(differences: Arc<dyn DifferenceRepository>, constants: GameConstants) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            differences,
            matchmaking: Arc::new(InMemoryMatchmakingRepository::new()),
            connected_clients: Mutex::new(HashMap::new()),
            constants,
        }
    }

    /// Send `event` to one client. Unknown or closed clients are skipped.
    pub async fn send_to(&self, client_id: &ClientId, event: &ServerEvent) {
        self.broadcast(std::slice::from_ref(client_id), event).await;
    }

    /// Send `event` to every client in `targets`.
    pub async fn broadcast(&self, targets: &[ClientId], event: &ServerEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize outbound event: {}", e);
                return;
            }
        };
        let clients = self.connected_clients.lock().await;
        for target_id in targets {
            if let Some(client_info) = clients.get(target_id)
                && client_info.sender.send(json.clone()).is_err()
            {
                tracing::warn!("Failed to send message to client '{}'", target_id);
            }
        }
    }

    pub async fn name_of(&self, client_id: &ClientId) -> Option<PlayerName> {
        let clients = self.connected_clients.lock().await;
        clients.get(client_id).and_then(|info| info.name.clone())
    }

    pub async fn set_name(&self, client_id: &ClientId, name: PlayerName) {
        let mut clients = self.connected_clients.lock().await;
        if let Some(info) = clients.get_mut(client_id) {
            info.name = Some(name);
        }
    }
}
