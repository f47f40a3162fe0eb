//! InMemory Matchmaking Repository 実装
//!
//! ドメインの Lobby を Mutex で包み、ハンドラ間で共有できるようにします。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientId, GameId, LeaveOutcome, Lobby, MatchRoom, MatchmakingRepository, Occupant, RoomId,
    Timestamp,
};

#[derive(Default)]
pub struct InMemoryMatchmakingRepository {
    lobby: Mutex<Lobby>,
}

impl InMemoryMatchmakingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchmakingRepository for InMemoryMatchmakingRepository {
    async fn start_matchmaking(
        &self,
        game_id: GameId,
        host: Occupant,
        created_at: Timestamp,
    ) -> RoomId {
        self.lobby
            .lock()
            .await
            .start_matchmaking(game_id, host, created_at)
    }

    async fn join_room(&self, game_id: &GameId, guest: Occupant) -> Option<MatchRoom> {
        self.lobby.lock().await.join_room(game_id, guest)
    }

    async fn merge_rooms_if_possible(&self, game_id: &GameId) -> Option<MatchRoom> {
        self.lobby.lock().await.merge_rooms_if_possible(game_id)
    }

    async fn accept_opponent(&self, host: &ClientId) -> Option<MatchRoom> {
        self.lobby.lock().await.accept_opponent(host)
    }

    async fn reject_opponent(&self, game_id: &GameId, host: &ClientId) -> Option<Occupant> {
        self.lobby.lock().await.reject_opponent(game_id, host)
    }

    async fn leave_waiting_room(&self, game_id: &GameId, client_id: &ClientId) -> LeaveOutcome {
        self.lobby.lock().await.leave_waiting_room(game_id, client_id)
    }

    async fn leave_room(&self, client_id: &ClientId) -> Option<Occupant> {
        self.lobby.lock().await.leave_room(client_id)
    }

    async fn take_accepted(&self, game_id: &GameId, client_id: &ClientId) -> Option<MatchRoom> {
        self.lobby.lock().await.take_accepted(game_id, client_id)
    }

    async fn restore_accepted(&self, room: MatchRoom) {
        self.lobby.lock().await.restore_accepted(room)
    }

    async fn remove_client(&self, client_id: &ClientId) -> Vec<Occupant> {
        self.lobby.lock().await.remove_client(client_id)
    }

    async fn waiting_rooms(&self) -> Vec<MatchRoom> {
        self.lobby.lock().await.waiting_rooms().to_vec()
    }
}
