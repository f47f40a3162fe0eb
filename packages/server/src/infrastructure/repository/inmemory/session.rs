//! InMemory Session Repository 実装
//!
//! アクティブなセッションを HashMap で管理します。
//! セッション本体はそれぞれ独立した Mutex で保護されます。
//! レジストリのロックを保持したままセッションのロックを待つことはないため、
//! セッションをロック中の呼び出し元から `close` を呼んでもデッドロックしません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::{sync::Mutex, task::AbortHandle};

use crate::domain::{
    ClientId, DeleteOutcome, GameSession, PlayerName, RegistryError, SessionBuilder,
    SessionError, SessionId, SessionIdFactory, SessionRepository, SharedSession,
};

struct SessionEntry {
    session: SharedSession,
    /// Players still in the session, in join order
    players: Vec<ClientId>,
    timer: Option<AbortHandle>,
}

impl SessionEntry {
    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, SessionEntry>,
    /// client_id -> session_id
    clients: HashMap<ClientId, SessionId>,
}

impl Registry {
    fn register(&mut self, session: GameSession) -> SharedSession {
        let session_id = session.session_id();
        let client_ids = session.state().client_ids();
        let shared = Arc::new(Mutex::new(session));

        for client_id in &client_ids {
            self.clients.insert(client_id.clone(), session_id);
        }
        if let Some(mut previous) = self.sessions.insert(
            session_id,
            SessionEntry {
                session: shared.clone(),
                players: client_ids,
                timer: None,
            },
        ) {
            previous.stop_timer();
            tracing::warn!("Session {} replaced an existing session", session_id);
        }
        tracing::info!("Session {} registered", session_id);
        shared
    }

    fn remove(&mut self, session_id: SessionId) -> Option<SessionEntry> {
        let mut entry = self.sessions.remove(&session_id)?;
        entry.stop_timer();
        self.clients.retain(|_, id| *id != session_id);
        Some(entry)
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    registry: Mutex<Registry>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.registry.lock().await.sessions.len()
    }

    /// Register a session under the id it was built with.
    #[cfg(test)]
    pub(crate) async fn insert(&self, session: GameSession) -> SharedSession {
        self.registry.lock().await.register(session)
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert_with_new_id(
        &self,
        build: SessionBuilder,
    ) -> Result<SharedSession, SessionError> {
        let mut registry = self.registry.lock().await;
        let session_id = SessionIdFactory::generate(&mut rand::thread_rng(), |candidate| {
            registry.sessions.contains_key(&candidate)
        });
        let session = build(session_id)?;
        Ok(registry.register(session))
    }

    async fn find(&self, session_id: SessionId) -> Option<SharedSession> {
        let registry = self.registry.lock().await;
        registry
            .sessions
            .get(&session_id)
            .map(|entry| entry.session.clone())
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Option<SharedSession> {
        let registry = self.registry.lock().await;
        let session_id = registry.clients.get(client_id)?;
        registry
            .sessions
            .get(session_id)
            .map(|entry| entry.session.clone())
    }

    async fn attach_timer(&self, session_id: SessionId, timer: AbortHandle) {
        let mut registry = self.registry.lock().await;
        match registry.sessions.get_mut(&session_id) {
            Some(entry) => {
                entry.stop_timer();
                entry.timer = Some(timer);
            }
            None => {
                // the session ended before its timer was attached
                timer.abort();
            }
        }
    }

    async fn stop_timer(&self, session_id: SessionId) {
        let mut registry = self.registry.lock().await;
        if let Some(entry) = registry.sessions.get_mut(&session_id) {
            entry.stop_timer();
        }
    }

    async fn delete(
        &self,
        session_id: SessionId,
        client_id: &ClientId,
    ) -> Result<DeleteOutcome, RegistryError> {
        let shared = self
            .find(session_id)
            .await
            .ok_or(RegistryError::SessionNotFound(session_id))?;

        let remaining = {
            let mut session = shared.lock().await;
            let keeps_partner = session.is_limited_time()
                && session.state().players().len() > 1
                && session.state().has_player(client_id);
            if keeps_partner {
                session.delete_player(client_id);
                Some(session.state().client_ids())
            } else {
                None
            }
        };

        let mut registry = self.registry.lock().await;
        if let Some(remaining) = remaining {
            registry.clients.remove(client_id);
            if let Some(entry) = registry.sessions.get_mut(&session_id) {
                entry.players = remaining.clone();
            }
            tracing::info!(
                "Client '{}' left limited-time session {}, partner keeps playing",
                client_id,
                session_id
            );
            return Ok(DeleteOutcome::PlayerRemoved { remaining });
        }
        let entry = registry
            .remove(session_id)
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        tracing::info!("Session {} deleted", session_id);
        Ok(DeleteOutcome::SessionClosed {
            players: entry.players,
        })
    }

    async fn close(&self, session_id: SessionId) -> Result<Vec<ClientId>, RegistryError> {
        let mut registry = self.registry.lock().await;
        let entry = registry
            .remove(session_id)
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        tracing::info!("Session {} closed", session_id);
        Ok(entry.players)
    }

    async fn set_player_name(&self, client_id: &ClientId, name: PlayerName) -> bool {
        match self.find_by_client(client_id).await {
            Some(shared) => shared.lock().await.state_mut().set_player_name(client_id, name),
            None => false,
        }
    }

    async fn list(&self) -> Vec<SharedSession> {
        let registry = self.registry.lock().await;
        registry
            .sessions
            .values()
            .map(|entry| entry.session.clone())
            .collect()
    }

    async fn clear(&self) {
        let mut registry = self.registry.lock().await;
        for entry in registry.sessions.values_mut() {
            entry.stop_timer();
        }
        registry.sessions.clear();
        registry.clients.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ClassicSession, Coordinate, DifferenceRegion, DifferenceSnapshot, DifferenceStore,
        GameConstants, GameId, LimitedTimeSession, Player,
    };
    use crate::infrastructure::repository::InMemoryDifferenceRepository;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - セッションの登録・検索（ID / クライアント ID）
    // - 削除時のタイマー停止と、限定時間モードでの一人だけの退出
    // - 存在しないセッションの削除がエラーになること
    // ========================================

    fn client(id: &str) -> ClientId {
        ClientId::new(id.to_string()).unwrap()
    }

    fn snapshot() -> DifferenceSnapshot {
        DifferenceSnapshot::new(vec![
            DifferenceRegion::new(vec![Coordinate::new(0, 0)]),
            DifferenceRegion::new(vec![Coordinate::new(9, 9)]),
            DifferenceRegion::new(vec![Coordinate::new(20, 20)]),
        ])
    }

    fn classic(session_id: SessionId, ids: &[&str]) -> GameSession {
        let store =
            DifferenceStore::new(GameId::new("g".to_string()).unwrap(), snapshot()).unwrap();
        let players = ids.iter().map(|id| Player::new(client(id), None)).collect();
        GameSession::Classic(
            ClassicSession::new(session_id, store, players, GameConstants::default()).unwrap(),
        )
    }

    async fn limited(session_id: SessionId, ids: &[&str]) -> GameSession {
        let games = InMemoryDifferenceRepository::with_games([(
            GameId::new("g".to_string()).unwrap(),
            snapshot(),
        )]);
        let players = ids.iter().map(|id| Player::new(client(id), None)).collect();
        let store = LimitedTimeSession::first_game(&games).await.unwrap();
        GameSession::LimitedTime(
            LimitedTimeSession::new(session_id, store, players, GameConstants::default()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        // テスト項目: 登録したセッションを ID とクライアント ID で検索できる
        // given (前提条件):
        let repository = InMemorySessionRepository::new();

        // when (操作):
        let shared = repository
            .insert_with_new_id(Box::new(|id| Ok(classic(id, &["a", "b"]))))
            .await
            .unwrap();
        let session_id = shared.lock().await.session_id();

        // then (期待する結果):
        assert!(repository.find(session_id).await.is_some());
        let by_client = repository.find_by_client(&client("b")).await.unwrap();
        assert_eq!(by_client.lock().await.session_id(), session_id);
        assert!(repository.find_by_client(&client("z")).await.is_none());
    }

    #[tokio::test]
    async fn test_generated_ids_avoid_active_sessions() {
        // テスト項目: 生成される ID はアクティブなセッションと重複しない
        let repository = InMemorySessionRepository::new();
        for _ in 0..50 {
            let shared = repository
                .insert_with_new_id(Box::new(|id| Ok(classic(id, &["a"]))))
                .await
                .unwrap();
            let id = shared.lock().await.session_id();
            assert!(Arc::ptr_eq(&repository.find(id).await.unwrap(), &shared));
        }
        assert_eq!(repository.count().await, 50);
    }

    #[tokio::test]
    async fn test_concurrent_starts_never_share_an_id() {
        // テスト項目: 同時に登録しても ID が重複せず、既存のセッションが置き換わらない
        // given (前提条件):
        let repository = Arc::new(InMemorySessionRepository::new());

        // when (操作):
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let repository = repository.clone();
                tokio::spawn(async move {
                    let shared = repository
                        .insert_with_new_id(Box::new(|id| Ok(classic(id, &["a"]))))
                        .await
                        .unwrap();
                    shared.lock().await.session_id()
                })
            })
            .collect();
        let mut ids = std::collections::HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }

        // then (期待する結果):
        assert_eq!(ids.len(), 32);
        assert_eq!(repository.count().await, 32);
    }

    #[tokio::test]
    async fn test_failed_build_registers_nothing() {
        // テスト項目: セッションの構築に失敗した場合は何も登録されない
        let repository = InMemorySessionRepository::new();
        let result = repository
            .insert_with_new_id(Box::new(|_| Err(SessionError::InvalidPlayerCount(3))))
            .await;
        assert_eq!(result.err(), Some(SessionError::InvalidPlayerCount(3)));
        assert_eq!(repository.count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_classic_stops_timer() {
        // テスト項目: クラシックのセッション削除でタイマーが停止し、一覧から消える
        // given (前提条件):
        let repository = InMemorySessionRepository::new();
        let session_id = SessionId::new(42);
        repository.insert(classic(session_id, &["a", "b"])).await;
        let timer = tokio::spawn(std::future::pending::<()>());
        repository.attach_timer(session_id, timer.abort_handle()).await;

        // when (操作):
        let outcome = repository.delete(session_id, &client("a")).await;

        // then (期待する結果):
        assert_eq!(
            outcome.unwrap(),
            DeleteOutcome::SessionClosed { players: vec![client("a"), client("b")] }
        );
        assert!(timer.await.unwrap_err().is_cancelled());
        assert!(repository.find(session_id).await.is_none());
        assert!(repository.find_by_client(&client("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_limited_time_keeps_partner() {
        // テスト項目: 限定時間モードで一人が抜けてもセッションは残る
        // given (前提条件):
        let repository = InMemorySessionRepository::new();
        let session_id = SessionId::new(7);
        repository.insert(limited(session_id, &["a", "b"]).await).await;

        // when (操作):
        let first = repository.delete(session_id, &client("a")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, DeleteOutcome::PlayerRemoved { remaining: vec![client("b")] });
        assert!(repository.find(session_id).await.is_some());
        assert!(repository.find_by_client(&client("a")).await.is_none());

        // when (操作): 最後の一人が抜ける
        let last = repository.delete(session_id, &client("b")).await.unwrap();

        // then (期待する結果):
        assert_eq!(last, DeleteOutcome::SessionClosed { players: vec![client("b")] });
        assert!(repository.find(session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_session() {
        // テスト項目: 存在しないセッションの削除はエラー
        let repository = InMemorySessionRepository::new();
        let result = repository.delete(SessionId::new(1), &client("a")).await;
        assert_eq!(result.unwrap_err(), RegistryError::SessionNotFound(SessionId::new(1)));
    }

    #[tokio::test]
    async fn test_stop_timer_twice_is_noop() {
        // テスト項目: タイマーの二重停止は何もしない
        let repository = InMemorySessionRepository::new();
        let session_id = SessionId::new(3);
        repository.insert(classic(session_id, &["a"])).await;
        let timer = tokio::spawn(std::future::pending::<()>());
        repository.attach_timer(session_id, timer.abort_handle()).await;

        repository.stop_timer(session_id).await;
        repository.stop_timer(session_id).await;

        assert!(timer.await.unwrap_err().is_cancelled());
        assert!(repository.find(session_id).await.is_some());
    }

    #[tokio::test]
    async fn test_set_player_name() {
        // テスト項目: クライアントのセッション内の名前を設定できる
        let repository = InMemorySessionRepository::new();
        let shared = repository.insert(classic(SessionId::new(5), &["a"])).await;
        let name = PlayerName::new("Alice".to_string()).unwrap();

        assert!(repository.set_player_name(&client("a"), name.clone()).await);
        assert!(!repository.set_player_name(&client("z"), name.clone()).await);
        assert_eq!(shared.lock().await.state().players()[0].name, Some(name));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        // テスト項目: シャットダウン時は全セッションが破棄される
        let repository = InMemorySessionRepository::new();
        repository.insert(classic(SessionId::new(1), &["a"])).await;
        repository.insert(classic(SessionId::new(2), &["b"])).await;
        repository.clear().await;
        assert!(repository.list().await.is_empty());
    }
}
