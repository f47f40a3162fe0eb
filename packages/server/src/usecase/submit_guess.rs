//! UseCase: 推測の送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitGuessUseCase::execute() メソッド
//! - 推測結果の通知対象と、勝者確定時のセッション終了
//!
//! ### なぜこのテストが必要か
//! - 勝者が決まったセッションがタイマーごと破棄されることを保証
//! - 不正な推測でセッションの状態が変わらないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：正解 / 不正解 / 勝利
//! - 異常系：存在しないセッション、不正な座標

use std::sync::Arc;

use crate::domain::{
    ClientId, DifferenceRepository, GuessCoordinate, GuessResult, PlayerName, SessionId,
    SessionRepository,
};

use super::error::GuessError;

/// Result of a guess plus who needs to hear about it
#[derive(Debug)]
pub struct GuessOutcome {
    pub result: GuessResult,
    /// Every player of the session, guesser included
    pub players: Vec<ClientId>,
    pub guesser_name: Option<PlayerName>,
    /// Name of the winner when the guess ended the session
    pub winner_name: Option<PlayerName>,
    /// The session was closed by this guess
    pub ended: bool,
}

/// 推測送信のユースケース
pub struct SubmitGuessUseCase {
    sessions: Arc<dyn SessionRepository>,
    differences: Arc<dyn DifferenceRepository>,
}

impl SubmitGuessUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        differences: Arc<dyn DifferenceRepository>,
    ) -> Self {
        Self {
            sessions,
            differences,
        }
    }

    /// 推測を実行
    ///
    /// セッションはロックしたまま判定されるため、同じセッションへの推測は
    /// 限定時間モードのゲーム切り替えを挟んでも順番に処理されます。
    pub async fn execute(
        &self,
        session_id: SessionId,
        client_id: &ClientId,
        guess: GuessCoordinate,
    ) -> Result<GuessOutcome, GuessError> {
        let shared = self
            .sessions
            .find(session_id)
            .await
            .ok_or(GuessError::SessionNotFound(session_id))?;

        let outcome = {
            let mut session = shared.lock().await;
            let result = session
                .try_guess(&guess, client_id, self.differences.as_ref())
                .await?;
            let state = session.state();
            let name_of = |id: &ClientId| {
                state
                    .players()
                    .iter()
                    .find(|p| &p.client_id == id)
                    .and_then(|p| p.name.clone())
            };
            GuessOutcome {
                guesser_name: name_of(client_id),
                winner_name: result.winner.as_ref().and_then(|w| name_of(w)),
                players: state.client_ids(),
                ended: result.winner.is_some(),
                result,
            }
        };

        if outcome.ended {
            match self.sessions.close(session_id).await {
                Ok(_) => tracing::info!("Session {} won by '{}'", session_id, client_id),
                Err(e) => tracing::warn!("Failed to close finished session: {}", e),
            }
        }
        Ok(outcome)
    }
}
