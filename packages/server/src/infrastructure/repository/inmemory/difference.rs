//! InMemory Difference Repository 実装

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DifferenceRepository, DifferenceSnapshot, GameId, RepositoryError};

/// BTreeMap をインメモリ DB として使用する実装
#[derive(Default)]
pub struct InMemoryDifferenceRepository {
    snapshots: RwLock<BTreeMap<GameId, DifferenceSnapshot>>,
}

impl InMemoryDifferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(games: impl IntoIterator<Item = (GameId, DifferenceSnapshot)>) -> Self {
        Self {
            snapshots: RwLock::new(games.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DifferenceRepository for InMemoryDifferenceRepository {
    async fn load(&self, game_id: &GameId) -> Result<DifferenceSnapshot, RepositoryError> {
        let snapshots = self.snapshots.read().await;
        let snapshot = snapshots
            .get(game_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(game_id.to_string()))?;
        if snapshot.is_empty() {
            return Err(RepositoryError::Empty(game_id.to_string()));
        }
        Ok(snapshot)
    }

    async fn save(
        &self,
        game_id: &GameId,
        snapshot: &DifferenceSnapshot,
    ) -> Result<(), RepositoryError> {
        if game_id.is_limited_time_lobby() {
            return Err(RepositoryError::Reserved(game_id.to_string()));
        }
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(game_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn list_games(&self) -> Result<Vec<GameId>, RepositoryError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.keys().cloned().collect())
    }
}
