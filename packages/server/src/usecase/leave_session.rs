//! UseCase: セッション退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveSessionUseCase::execute() / disconnect()
//! - 退出時の通知対象（残されたプレイヤー）の選定
//!
//! ### どのような状況を想定しているか
//! - 正常系：クラシックの退出（セッション終了）、限定時間モードの片方だけの退出
//! - 異常系：既に終了したセッションからの重複した退出

use std::sync::Arc;

use crate::domain::{ClientId, DeleteOutcome, RegistryError, SessionId, SessionRepository};

/// セッション退出のユースケース
pub struct LeaveSessionUseCase {
    sessions: Arc<dyn SessionRepository>,
}

impl LeaveSessionUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// `client_id` を `session_id` から退出させる
    ///
    /// # Returns
    ///
    /// 通知対象（退出したクライアント以外のプレイヤー）のリスト
    pub async fn execute(
        &self,
        session_id: SessionId,
        client_id: &ClientId,
    ) -> Result<Vec<ClientId>, RegistryError> {
        let outcome = self.sessions.delete(session_id, client_id).await?;
        let players = match outcome {
            DeleteOutcome::SessionClosed { players } => players,
            DeleteOutcome::PlayerRemoved { remaining } => remaining,
        };
        Ok(players.into_iter().filter(|id| id != client_id).collect())
    }

    /// 切断したクライアントのセッションがあれば退出させる
    pub async fn disconnect(&self, client_id: &ClientId) -> Option<(SessionId, Vec<ClientId>)> {
        let shared = self.sessions.find_by_client(client_id).await?;
        let session_id = shared.lock().await.session_id();
        match self.execute(session_id, client_id).await {
            Ok(targets) => Some((session_id, targets)),
            Err(e) => {
                tracing::warn!("Client '{}' could not leave: {}", client_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ClassicSession, Coordinate, DifferenceRegion, DifferenceSnapshot, DifferenceStore,
            GameConstants, GameId, GameSession, LimitedTimeSession, Player,
        },
        infrastructure::repository::{InMemoryDifferenceRepository, InMemorySessionRepository},
    };

    fn client(id: &str) -> ClientId {
        ClientId::new(id.to_string()).unwrap()
    }

    fn snapshot() -> DifferenceSnapshot {
        DifferenceSnapshot::new(vec![DifferenceRegion::new(vec![Coordinate::new(1, 1)])])
    }

    fn players() -> Vec<Player> {
        vec![Player::new(client("a"), None), Player::new(client("b"), None)]
    }

    #[tokio::test]
    async fn test_leaving_classic_ends_session() {
        // テスト項目: クラシックで一人が抜けるとセッションが終了し、相手に通知される
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let store = DifferenceStore::new(GameId::new("g".to_string()).unwrap(), snapshot()).unwrap();
        let session =
            ClassicSession::new(SessionId::new(5), store, players(), GameConstants::default())
                .unwrap();
        sessions.insert(GameSession::Classic(session)).await;
        let usecase = LeaveSessionUseCase::new(sessions.clone());

        // when (操作):
        let targets = usecase.execute(SessionId::new(5), &client("a")).await.unwrap();

        // then (期待する結果):
        assert_eq!(targets, vec![client("b")]);
        assert!(sessions.find(SessionId::new(5)).await.is_none());

        // 重複した退出はエラー（呼び出し側でログに残して無視する）
        let again = usecase.execute(SessionId::new(5), &client("b")).await;
        assert_eq!(again.unwrap_err(), RegistryError::SessionNotFound(SessionId::new(5)));
    }

    #[tokio::test]
    async fn test_disconnect_from_limited_time_keeps_partner() {
        // テスト項目: 限定時間モードで切断しても相方のセッションは続く
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let games = InMemoryDifferenceRepository::with_games([(
            GameId::new("g".to_string()).unwrap(),
            snapshot(),
        )]);
        let store = LimitedTimeSession::first_game(&games).await.unwrap();
        let session =
            LimitedTimeSession::new(SessionId::new(6), store, players(), GameConstants::default())
                .unwrap();
        sessions.insert(GameSession::LimitedTime(session)).await;
        let usecase = LeaveSessionUseCase::new(sessions.clone());

        // when (操作):
        let left = usecase.disconnect(&client("b")).await;

        // then (期待する結果):
        assert_eq!(left, Some((SessionId::new(6), vec![client("a")])));
        assert!(sessions.find_by_client(&client("a")).await.is_some());
        assert!(usecase.disconnect(&client("b")).await.is_none());
    }
}
