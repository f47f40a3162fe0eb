//! UseCase: セッション開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartSessionUseCase::start_classic() / start_limited_time()
//! - ソロ / マッチメイキング済みの 2 人でのセッション構築と登録
//!
//! ### なぜこのテストが必要か
//! - 差分データが読めないゲームでセッションが始まらないことを保証
//! - 承認済みルームの 2 人が同じセッションに入ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ソロ / 2 人対戦の開始
//! - 異常系：差分データなし、承認済みルームなし、二重参加

use std::sync::Arc;

use crate::domain::{
    ClassicSession, ClientId, DifferenceRepository, GameConstants, GameId, GameSession,
    LimitedTimeSession, MatchRoom, MatchmakingRepository, Occupant, Player, SessionBuilder,
    SessionError, SessionId, SessionRepository, SharedSession, load_store,
};

use super::error::StartSessionError;

/// A newly registered session
pub struct StartedSession {
    pub session_id: SessionId,
    pub game_id: GameId,
    /// In player order; the host comes first
    pub players: Vec<ClientId>,
    pub session: SharedSession,
}

/// セッション開始のユースケース
pub struct StartSessionUseCase {
    sessions: Arc<dyn SessionRepository>,
    differences: Arc<dyn DifferenceRepository>,
    matchmaking: Arc<dyn MatchmakingRepository>,
    constants: GameConstants,
}

impl StartSessionUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        differences: Arc<dyn DifferenceRepository>,
        matchmaking: Arc<dyn MatchmakingRepository>,
        constants: GameConstants,
    ) -> Self {
        Self {
            sessions,
            differences,
            matchmaking,
            constants,
        }
    }

    /// クラシックセッションを開始
    ///
    /// 2 人対戦の場合は `game_id` のルームで承認済みの相手が必要です。
    pub async fn start_classic(
        &self,
        client: Occupant,
        game_id: GameId,
        is_solo: bool,
    ) -> Result<StartedSession, StartSessionError> {
        if game_id.is_limited_time_lobby() {
            return Err(StartSessionError::ReservedGameId(game_id.to_string()));
        }
        self.ensure_not_playing(&client.client_id).await?;

        // 1. 差分データを読み込む（失敗したらルームには触れない）
        let store = load_store(self.differences.as_ref(), &game_id).await?;

        // 2. 承認済みルームを取り出してプレイヤーを決定
        let room = self.take_room(&client, &game_id, is_solo).await?;
        let players = players_of(client, room.as_ref());

        // 3. ID の採番と登録
        let constants = self.constants;
        let build: SessionBuilder = Box::new(move |session_id| {
            let session = ClassicSession::new(session_id, store, players, constants)?;
            Ok(GameSession::Classic(session))
        });
        self.register(build, room).await
    }

    /// 限定時間セッションを開始
    pub async fn start_limited_time(
        &self,
        client: Occupant,
        is_solo: bool,
    ) -> Result<StartedSession, StartSessionError> {
        self.ensure_not_playing(&client.client_id).await?;

        let store = LimitedTimeSession::first_game(self.differences.as_ref()).await?;

        let room = self
            .take_room(&client, &GameId::limited_time_lobby(), is_solo)
            .await?;
        let players = players_of(client, room.as_ref());

        let constants = self.constants;
        let build: SessionBuilder = Box::new(move |session_id| {
            let session = LimitedTimeSession::new(session_id, store, players, constants)?;
            Ok(GameSession::LimitedTime(session))
        });
        self.register(build, room).await
    }

    async fn ensure_not_playing(&self, client_id: &ClientId) -> Result<(), StartSessionError> {
        match self.sessions.find_by_client(client_id).await {
            Some(existing) => {
                let session_id = existing.lock().await.session_id();
                Err(StartSessionError::AlreadyInSession(session_id))
            }
            None => Ok(()),
        }
    }

    /// Take the accepted room of `client`. Solo sessions need none.
    async fn take_room(
        &self,
        client: &Occupant,
        lobby: &GameId,
        is_solo: bool,
    ) -> Result<Option<MatchRoom>, StartSessionError> {
        if is_solo {
            return Ok(None);
        }
        self.matchmaking
            .take_accepted(lobby, &client.client_id)
            .await
            .map(Some)
            .ok_or_else(|| StartSessionError::NoAcceptedRoom(lobby.to_string()))
    }

    async fn register(
        &self,
        build: SessionBuilder,
        room: Option<MatchRoom>,
    ) -> Result<StartedSession, StartSessionError> {
        let session = match self.sessions.insert_with_new_id(build).await {
            Ok(session) => session,
            Err(e) => return Err(self.restore(room, e).await),
        };

        let (session_id, game_id, players, mode) = {
            let session = session.lock().await;
            let mode = if session.is_limited_time() {
                "limited-time"
            } else {
                "classic"
            };
            (
                session.session_id(),
                session.state().game_id().clone(),
                session.state().client_ids(),
                mode,
            )
        };
        tracing::info!(
            "Started {} session {} on game '{}' for {} player(s)",
            mode,
            session_id,
            game_id,
            players.len()
        );
        Ok(StartedSession {
            session_id,
            game_id,
            players,
            session,
        })
    }

    /// Give the room back so the pair can try again.
    async fn restore(&self, room: Option<MatchRoom>, error: SessionError) -> StartSessionError {
        tracing::warn!("Session could not be built: {}", error);
        if let Some(room) = room {
            self.matchmaking.restore_accepted(room).await;
        }
        error.into()
    }
}

/// Host first, then the guest of the room; `client` alone when solo.
fn players_of(client: Occupant, room: Option<&MatchRoom>) -> Vec<Player> {
    match room {
        None => vec![Player::new(client.client_id, client.name)],
        Some(room) => std::iter::once(&room.host)
            .chain(room.guest.as_ref())
            .map(|occupant| Player::new(occupant.client_id.clone(), occupant.name.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Coordinate, DifferenceRegion, DifferenceSnapshot, PlayerName, RepositoryError,
            Timestamp, repository::MockDifferenceRepository,
        },
        infrastructure::repository::{
            InMemoryDifferenceRepository, InMemoryMatchmakingRepository,
            InMemorySessionRepository,
        },
    };

    fn game(id: &str) -> GameId {
        GameId::new(id.to_string()).unwrap()
    }

    fn occupant(id: &str) -> Occupant {
        Occupant::new(
            ClientId::new(id.to_string()).unwrap(),
            PlayerName::new(id.to_uppercase()).ok(),
        )
    }

    fn snapshot() -> DifferenceSnapshot {
        DifferenceSnapshot::new(
            (0..3)
                .map(|i| DifferenceRegion::new(vec![Coordinate::new(i * 10, i * 10)]))
                .collect(),
        )
    }

    struct Fixture {
        sessions: Arc<InMemorySessionRepository>,
        matchmaking: Arc<InMemoryMatchmakingRepository>,
        usecase: StartSessionUseCase,
    }

    fn fixture_with(differences: Arc<dyn DifferenceRepository>) -> Fixture {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let matchmaking = Arc::new(InMemoryMatchmakingRepository::new());
        let usecase = StartSessionUseCase::new(
            sessions.clone(),
            differences,
            matchmaking.clone(),
            GameConstants::default(),
        );
        Fixture {
            sessions,
            matchmaking,
            usecase,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemoryDifferenceRepository::with_games([
            (game("cats"), snapshot()),
            (game("dogs"), snapshot()),
        ])))
    }

    async fn accepted_room(matchmaking: &InMemoryMatchmakingRepository, lobby: &GameId) {
        matchmaking
            .start_matchmaking(lobby.clone(), occupant("host"), Timestamp::new(1))
            .await;
        matchmaking.join_room(lobby, occupant("guest")).await.unwrap();
        matchmaking
            .accept_opponent(&occupant("host").client_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_solo_classic() {
        // テスト項目: ソロのクラシックセッションが登録される
        // given (前提条件):
        let f = fixture();

        // when (操作):
        let started = f
            .usecase
            .start_classic(occupant("alice"), game("cats"), true)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(started.players, vec![occupant("alice").client_id]);
        assert_eq!(started.game_id, game("cats"));
        let registered = f.sessions.find(started.session_id).await.unwrap();
        assert!(!registered.lock().await.is_limited_time());
    }

    #[tokio::test]
    async fn test_start_multiplayer_classic_from_accepted_room() {
        // テスト項目: 承認済みルームのホストとゲストで 2 人対戦が始まる
        // given (前提条件):
        let f = fixture();
        accepted_room(&f.matchmaking, &game("cats")).await;

        // when (操作): ゲスト側から開始しても順序はホストが先
        let started = f
            .usecase
            .start_classic(occupant("guest"), game("cats"), false)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            started.players,
            vec![occupant("host").client_id, occupant("guest").client_id]
        );
        let session = started.session.lock().await;
        assert_eq!(
            session.state().players()[1].name,
            PlayerName::new("GUEST".to_string()).ok()
        );
    }

    #[tokio::test]
    async fn test_start_multiplayer_without_room() {
        // テスト項目: 承認済みルームがなければ 2 人対戦は始まらない
        let f = fixture();
        let result = f
            .usecase
            .start_classic(occupant("host"), game("cats"), false)
            .await;
        assert!(matches!(result, Err(StartSessionError::NoAcceptedRoom(_))));
        assert_eq!(f.sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_second_start_reports_running_session() {
        // テスト項目: プレイ中のクライアントは新しいセッションを開始できない
        // given (前提条件):
        let f = fixture();
        accepted_room(&f.matchmaking, &game("cats")).await;
        let started = f
            .usecase
            .start_classic(occupant("host"), game("cats"), false)
            .await
            .unwrap();

        // when (操作): ゲストも開始要求を送る
        let result = f
            .usecase
            .start_classic(occupant("guest"), game("cats"), false)
            .await;

        // then (期待する結果):
        assert_eq!(
            result.err(),
            Some(StartSessionError::AlreadyInSession(started.session_id))
        );
    }

    #[tokio::test]
    async fn test_missing_difference_data_prevents_start() {
        // テスト項目: 差分データが壊れているゲームではセッションが作られない
        // given (前提条件):
        let mut differences = MockDifferenceRepository::new();
        differences.expect_load().returning(|game_id| {
            Err(RepositoryError::Corrupt {
                game_id: game_id.to_string(),
                reason: "truncated".to_string(),
            })
        });
        let f = fixture_with(Arc::new(differences));

        // when (操作):
        let result = f
            .usecase
            .start_classic(occupant("alice"), game("cats"), true)
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(StartSessionError::Data(RepositoryError::Corrupt { .. }))
        ));
        assert_eq!(f.sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_start_limited_time_coop() {
        // テスト項目: 限定時間モードは専用ロビーの承認済みルームで 2 人協力になる
        // given (前提条件):
        let f = fixture();
        accepted_room(&f.matchmaking, &GameId::limited_time_lobby()).await;

        // when (操作):
        let started = f
            .usecase
            .start_limited_time(occupant("host"), false)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(started.players.len(), 2);
        assert!(started.session.lock().await.is_limited_time());
        assert!([game("cats"), game("dogs")].contains(&started.game_id));
    }

    #[tokio::test]
    async fn test_start_limited_time_without_games() {
        // テスト項目: ゲームが一つもなければ限定時間モードは始まらない
        let f = fixture_with(Arc::new(InMemoryDifferenceRepository::new()));
        let result = f.usecase.start_limited_time(occupant("alice"), true).await;
        assert!(matches!(result, Err(StartSessionError::Session(_))));
    }

    #[tokio::test]
    async fn test_failed_limited_time_start_keeps_the_pairing() {
        // テスト項目: ゲームがなく開始に失敗しても、承認済みのペアは解消されない
        // given (前提条件):
        let f = fixture_with(Arc::new(InMemoryDifferenceRepository::new()));
        let lobby = GameId::limited_time_lobby();
        accepted_room(&f.matchmaking, &lobby).await;

        // when (操作):
        let result = f.usecase.start_limited_time(occupant("guest"), false).await;

        // then (期待する結果):
        assert_eq!(
            result.err(),
            Some(StartSessionError::Session(SessionError::NoGameAvailable))
        );
        let room = f
            .matchmaking
            .take_accepted(&lobby, &occupant("host").client_id)
            .await;
        assert!(room.is_some());
    }

    #[tokio::test]
    async fn test_lobby_key_cannot_start_classic() {
        // テスト項目: 限定時間モードのロビーキーではクラシックセッションを開始できない
        // given (前提条件): 同名のゲームデータが存在しても
        let f = fixture_with(Arc::new(InMemoryDifferenceRepository::with_games([(
            GameId::limited_time_lobby(),
            snapshot(),
        )])));

        // when (操作):
        let result = f
            .usecase
            .start_classic(occupant("alice"), GameId::limited_time_lobby(), true)
            .await;

        // then (期待する結果):
        assert_eq!(
            result.err(),
            Some(StartSessionError::ReservedGameId("limited-time".to_string()))
        );
        assert_eq!(f.sessions.count().await, 0);
    }
}
