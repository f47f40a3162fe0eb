//! JSON file Difference Repository 実装
//!
//! ゲームごとに `<game-id>.json` を一つ保存します。
//! 中身は `{x, y}` の配列の配列（領域のリスト）です。

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::domain::{DifferenceRepository, DifferenceSnapshot, GameId, RepositoryError};

const EXTENSION: &str = "json";

/// ディレクトリ内の JSON ファイルを読み書きする Repository
pub struct JsonDifferenceRepository {
    directory: PathBuf,
}

impl JsonDifferenceRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_of(&self, game_id: &GameId) -> PathBuf {
        self.directory
            .join(game_id.as_str())
            .with_extension(EXTENSION)
    }
}

#[async_trait]
impl DifferenceRepository for JsonDifferenceRepository {
    async fn load(&self, game_id: &GameId) -> Result<DifferenceSnapshot, RepositoryError> {
        let path = self.path_of(game_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RepositoryError::NotFound(game_id.to_string()),
            _ => RepositoryError::Io(format!("{}: {}", path.display(), e)),
        })?;

        let snapshot: DifferenceSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Corrupt {
                game_id: game_id.to_string(),
                reason: e.to_string(),
            })?;
        if snapshot.is_empty() {
            return Err(RepositoryError::Empty(game_id.to_string()));
        }
        tracing::debug!(
            "Loaded {} difference regions for game '{}'",
            snapshot.len(),
            game_id
        );
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
        let json =
            serde_json::to_vec(snapshot).map_err(|e| RepositoryError::Io(e.to_string()))?;
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        let path = self.path_of(game_id);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| RepositoryError::Io(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Saved difference data of game '{}' to {}", game_id, path.display());
        Ok(())
    }

    async fn list_games(&self) -> Result<Vec<GameId>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };

        let mut games = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // files that are not named after a game are ignored
            match GameId::new(stem.to_string()) {
                Ok(game_id) if !game_id.is_limited_time_lobby() => games.push(game_id),
                _ => {}
            }
        }
        games.sort();
        Ok(games)
    }
}
