//! UseCase: マッチメイキング処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 待機ルームの作成 → 参加 → 承認 / 拒否 の流れ
//! - 退出・切断時に残された相手の選定
//!
//! ### なぜこのテストが必要か
//! - 同じゲームを待つ 2 人が必ず一つのルームにまとまることを保証
//! - 相手がいないときの参加要求が何もしないことを確認

use std::sync::Arc;

use crate::domain::{
    ClientId, GameId, LeaveOutcome, MatchRoom, MatchmakingRepository, Occupant, RoomId, Timestamp,
};

use super::error::MatchmakingError;

/// A waiting room was opened, possibly merged right away with another one
#[derive(Debug)]
pub struct StartedMatchmaking {
    pub room_id: RoomId,
    pub merged: Option<MatchRoom>,
}

/// マッチメイキングのユースケース
pub struct MatchmakingUseCase {
    matchmaking: Arc<dyn MatchmakingRepository>,
}

impl MatchmakingUseCase {
    pub fn new(matchmaking: Arc<dyn MatchmakingRepository>) -> Self {
        Self { matchmaking }
    }

    /// 待機ルームを作成し、同じゲームの待機ルームがあれば統合する
    pub async fn start(
        &self,
        game_id: String,
        host: Occupant,
        created_at: Timestamp,
    ) -> Result<StartedMatchmaking, MatchmakingError> {
        let game_id = GameId::new(game_id)?;
        let room_id = self
            .matchmaking
            .start_matchmaking(game_id.clone(), host, created_at)
            .await;
        tracing::info!("Waiting room '{}' opened", room_id);

        let merged = self.matchmaking.merge_rooms_if_possible(&game_id).await;
        if let Some(room) = &merged {
            tracing::info!("Waiting rooms of game '{}' merged into '{}'", game_id, room.id);
        }
        Ok(StartedMatchmaking { room_id, merged })
    }

    /// 最も古い待機ルームに参加する。待機ルームがなければ何もしない
    pub async fn join(
        &self,
        game_id: String,
        guest: Occupant,
    ) -> Result<Option<MatchRoom>, MatchmakingError> {
        let game_id = GameId::new(game_id)?;
        let room = self.matchmaking.join_room(&game_id, guest).await;
        match &room {
            Some(room) => tracing::info!("Room '{}' is now paired", room.id),
            None => tracing::debug!("No waiting room for game '{}'", game_id),
        }
        Ok(room)
    }

    /// ホストが相手を承認する
    pub async fn accept(&self, host: &ClientId) -> Result<MatchRoom, MatchmakingError> {
        self.matchmaking
            .accept_opponent(host)
            .await
            .ok_or(MatchmakingError::NoPendingOpponent)
    }

    /// ホストが相手を拒否する。ルームは待機列に戻る
    ///
    /// # Returns
    ///
    /// 拒否されたゲスト
    pub async fn reject(
        &self,
        game_id: String,
        host: &ClientId,
    ) -> Result<Occupant, MatchmakingError> {
        let game_id = GameId::new(game_id)?;
        self.matchmaking
            .reject_opponent(&game_id, host)
            .await
            .ok_or(MatchmakingError::NoPendingOpponent)
    }

    pub async fn leave_waiting_room(
        &self,
        game_id: String,
        client_id: &ClientId,
    ) -> Result<LeaveOutcome, MatchmakingError> {
        let game_id = GameId::new(game_id)?;
        Ok(self.matchmaking.leave_waiting_room(&game_id, client_id).await)
    }

    /// ペアになったルームから抜ける。残された相手を返す
    pub async fn leave_room(&self, client_id: &ClientId) -> Option<Occupant> {
        self.matchmaking.leave_room(client_id).await
    }

    /// 切断したクライアントを全てのルームから取り除く
    pub async fn disconnect(&self, client_id: &ClientId) -> Vec<Occupant> {
        self.matchmaking.remove_client(client_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{PlayerName, ValueObjectError},
        infrastructure::repository::InMemoryMatchmakingRepository,
    };

    fn occupant(id: &str) -> Occupant {
        Occupant::new(
            ClientId::new(id.to_string()).unwrap(),
            PlayerName::new(id.to_uppercase()).ok(),
        )
    }

    fn usecase() -> (Arc<InMemoryMatchmakingRepository>, MatchmakingUseCase) {
        let repository = Arc::new(InMemoryMatchmakingRepository::new());
        (repository.clone(), MatchmakingUseCase::new(repository))
    }

    #[tokio::test]
    async fn test_join_pairs_with_waiting_host() {
        // テスト項目: 待機中のルームに参加するとペアになり、待機列から消える
        // given (前提条件):
        let (repository, usecase) = usecase();
        usecase
            .start("7".to_string(), occupant("host"), Timestamp::new(1))
            .await
            .unwrap();

        // when (操作):
        let room = usecase.join("7".to_string(), occupant("x")).await.unwrap();

        // then (期待する結果):
        let room = room.unwrap();
        assert_eq!(room.host, occupant("host"));
        assert_eq!(room.guest, Some(occupant("x")));
        assert!(repository.waiting_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_without_waiting_room_is_noop() {
        // テスト項目: 待機ルームがなければ参加要求は何もしない
        let (repository, usecase) = usecase();
        let room = usecase.join("7".to_string(), occupant("x")).await.unwrap();
        assert_eq!(room, None);
        assert!(repository.waiting_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_two_hosts_are_merged() {
        // テスト項目: 同じゲームで待つ 2 人はルームが統合される
        // given (前提条件):
        let (_repository, usecase) = usecase();
        usecase
            .start("cats".to_string(), occupant("a"), Timestamp::new(1))
            .await
            .unwrap();

        // when (操作):
        let started = usecase
            .start("cats".to_string(), occupant("b"), Timestamp::new(2))
            .await
            .unwrap();

        // then (期待する結果): 古いルームのホストが残り、新しい方がゲストになる
        let merged = started.merged.unwrap();
        assert_eq!(merged.host, occupant("a"));
        assert_eq!(merged.guest, Some(occupant("b")));
    }

    #[tokio::test]
    async fn test_accept_and_reject() {
        // テスト項目: 承認はペアのルームでのみ成功し、拒否するとルームは待機列に戻る
        // given (前提条件):
        let (repository, usecase) = usecase();
        let host = occupant("host");
        usecase
            .start("cats".to_string(), host.clone(), Timestamp::new(1))
            .await
            .unwrap();
        assert_eq!(
            usecase.accept(&host.client_id).await.unwrap_err(),
            MatchmakingError::NoPendingOpponent
        );
        usecase.join("cats".to_string(), occupant("guest")).await.unwrap();

        // when (操作):
        let rejected = usecase.reject("cats".to_string(), &host.client_id).await;

        // then (期待する結果):
        assert_eq!(rejected.unwrap(), occupant("guest"));
        let waiting = repository.waiting_rooms().await;
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].host, host);
    }

    #[tokio::test]
    async fn test_invalid_game_id() {
        // テスト項目: 不正なゲーム ID はエラー
        let (_repository, usecase) = usecase();
        let result = usecase
            .start("../etc".to_string(), occupant("a"), Timestamp::new(1))
            .await;
        assert_eq!(
            result.unwrap_err(),
            MatchmakingError::InvalidGameId(ValueObjectError::GameIdInvalidFormat(
                "../etc".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_disconnect_returns_abandoned_opponent() {
        // テスト項目: 切断したホストの相手が通知対象として返る
        let (_repository, usecase) = usecase();
        usecase
            .start("cats".to_string(), occupant("host"), Timestamp::new(1))
            .await
            .unwrap();
        usecase.join("cats".to_string(), occupant("guest")).await.unwrap();

        let abandoned = usecase.disconnect(&occupant("host").client_id).await;
        assert_eq!(abandoned, vec![occupant("guest")]);
    }
}
