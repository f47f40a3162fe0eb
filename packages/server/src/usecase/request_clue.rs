//! UseCase: ヒント要求処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RequestClueUseCase::execute() メソッド
//! - ヒント回数の上限と時間ペナルティ
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 回目（四分割セル）と 2 回目（ピクセル）
//! - 異常系：3 回目以降、セッション外のクライアント

use std::sync::Arc;

use crate::domain::{
    ClientId, Clue, PlayerName, SessionId, SessionRepository, generate_clue,
};

use super::error::ClueError;

#[derive(Debug)]
pub struct ClueOutcome {
    pub session_id: SessionId,
    pub clue: Clue,
    /// Players to tell that a clue was used
    pub players: Vec<ClientId>,
    pub requester_name: Option<PlayerName>,
}

/// ヒント要求のユースケース
pub struct RequestClueUseCase {
    sessions: Arc<dyn SessionRepository>,
}

impl RequestClueUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// `client_id` のセッションでヒントを一つ使う
    pub async fn execute(&self, client_id: &ClientId) -> Result<ClueOutcome, ClueError> {
        let shared = self
            .sessions
            .find_by_client(client_id)
            .await
            .ok_or(ClueError::NotInSession)?;
        let mut session = shared.lock().await;

        if session.state().not_found_differences().is_empty() {
            return Err(ClueError::NothingLeft);
        }
        if !session.handle_clue_request() {
            return Err(ClueError::Exhausted);
        }
        let clue =
            generate_clue(session.state(), &mut rand::thread_rng()).ok_or(ClueError::NothingLeft)?;

        let state = session.state();
        tracing::info!(
            "Client '{}' used a clue in session {} ({} left)",
            client_id,
            state.session_id(),
            clue.clues_left
        );
        Ok(ClueOutcome {
            session_id: state.session_id(),
            clue,
            players: state.client_ids(),
            requester_name: state
                .players()
                .iter()
                .find(|p| &p.client_id == client_id)
                .and_then(|p| p.name.clone()),
        })
    }
}
