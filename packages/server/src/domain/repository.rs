//! Repository traits.
//!
//! The domain defines what it needs from storage; infrastructure provides the
//! implementations (dependency inversion).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::Mutex, task::AbortHandle};

use super::{
    difference::{DifferenceSnapshot, DifferenceStore},
    error::{RepositoryError, SessionError},
    matchmaking::{LeaveOutcome, MatchRoom, Occupant, RoomId},
    session::GameSession,
    value_object::{ClientId, GameId, PlayerName, SessionId, Timestamp},
};

/// Persisted difference snapshots, one per game.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DifferenceRepository: Send + Sync {
    /// Load the snapshot of `game_id`.
    async fn load(&self, game_id: &GameId) -> Result<DifferenceSnapshot, RepositoryError>;

    /// Persist the snapshot of `game_id`, replacing any previous one.
    async fn save(
        &self,
        game_id: &GameId,
        snapshot: &DifferenceSnapshot,
    ) -> Result<(), RepositoryError>;

    /// Identifiers of every stored game.
    async fn list_games(&self) -> Result<Vec<GameId>, RepositoryError>;
}

/// Load `game_id` and wrap it for session-time lookups.
pub async fn load_store(
    repository: &dyn DifferenceRepository,
    game_id: &GameId,
) -> Result<DifferenceStore, RepositoryError> {
    let snapshot = repository.load(game_id).await?;
    DifferenceStore::new(game_id.clone(), snapshot)
}

/// A live session, locked for the whole duration of each operation.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Builds a session around the id the registry picked for it.
pub type SessionBuilder = Box<dyn FnOnce(SessionId) -> Result<GameSession, SessionError> + Send>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no active session with id {0}")]
    SessionNotFound(SessionId),
}

/// What deleting a player from a session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The session was stopped and removed; these players were in it
    SessionClosed { players: Vec<ClientId> },
    /// Limited-time only: the player left, the partner keeps playing
    PlayerRemoved { remaining: Vec<ClientId> },
}

/// Active sessions, keyed by session id.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Pick a random id not used by any active session, build the session
    /// with it and register it, all under one registry lock.
    ///
    /// Nothing is registered when `build` fails.
    async fn insert_with_new_id(&self, build: SessionBuilder)
    -> Result<SharedSession, SessionError>;

    async fn find(&self, session_id: SessionId) -> Option<SharedSession>;

    async fn find_by_client(&self, client_id: &ClientId) -> Option<SharedSession>;

    /// Attach the timer task of a session. Replaces and stops a previous one.
    async fn attach_timer(&self, session_id: SessionId, timer: AbortHandle);

    /// Stop the timer of a session. Stopping twice is a no-op.
    async fn stop_timer(&self, session_id: SessionId);

    /// Remove `client_id` from `session_id`.
    ///
    /// Closes the session unless it is a limited-time match with a partner
    /// still playing.
    async fn delete(
        &self,
        session_id: SessionId,
        client_id: &ClientId,
    ) -> Result<DeleteOutcome, RegistryError>;

    /// Stop and remove the session regardless of its players.
    async fn close(&self, session_id: SessionId) -> Result<Vec<ClientId>, RegistryError>;

    /// Set the name of `client_id` in its session, if any.
    async fn set_player_name(&self, client_id: &ClientId, name: PlayerName) -> bool;

    async fn list(&self) -> Vec<SharedSession>;

    /// Stop every timer and drop every session.
    async fn clear(&self);
}

/// Matchmaking rooms.
#[async_trait]
pub trait MatchmakingRepository: Send + Sync {
    async fn start_matchmaking(
        &self,
        game_id: GameId,
        host: Occupant,
        created_at: Timestamp,
    ) -> RoomId;

    async fn join_room(&self, game_id: &GameId, guest: Occupant) -> Option<MatchRoom>;

    async fn merge_rooms_if_possible(&self, game_id: &GameId) -> Option<MatchRoom>;

    async fn accept_opponent(&self, host: &ClientId) -> Option<MatchRoom>;

    async fn reject_opponent(&self, game_id: &GameId, host: &ClientId) -> Option<Occupant>;

    async fn leave_waiting_room(&self, game_id: &GameId, client_id: &ClientId) -> LeaveOutcome;

    async fn leave_room(&self, client_id: &ClientId) -> Option<Occupant>;

    async fn take_accepted(&self, game_id: &GameId, client_id: &ClientId) -> Option<MatchRoom>;

    /// Put back an accepted room whose session could not be started.
    async fn restore_accepted(&self, room: MatchRoom);

    async fn remove_client(&self, client_id: &ClientId) -> Vec<Occupant>;

    async fn waiting_rooms(&self) -> Vec<MatchRoom>;
}
