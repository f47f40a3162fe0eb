//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, SessionError, SessionId, ValueObjectError};

/// セッション開始時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartSessionError {
    /// 差分データを読み込めない
    #[error(transparent)]
    Data(#[from] RepositoryError),

    /// セッションを構築できない
    #[error(transparent)]
    Session(#[from] SessionError),

    /// 限定時間モードのロビーキーはゲームとして開始できない
    #[error("game id '{0}' is reserved for limited-time matchmaking")]
    ReservedGameId(String),

    /// 対戦相手が承認済みのルームがない
    #[error("no accepted opponent for game '{0}'")]
    NoAcceptedRoom(String),

    /// クライアントは既にセッションに参加している
    #[error("client is already playing session {0}")]
    AlreadyInSession(SessionId),
}

/// 推測の送信時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("no active session with id {0}")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// ヒント要求時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClueError {
    #[error("client is not playing any session")]
    NotInSession,

    /// 許可されたヒント回数を使い切った
    #[error("no clue left")]
    Exhausted,

    /// 全ての差分が発見済み
    #[error("every difference is already found")]
    NothingLeft,
}

/// マッチメイキングのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchmakingError {
    #[error(transparent)]
    InvalidGameId(#[from] ValueObjectError),

    /// ホストのルームに対戦相手がいない
    #[error("no opponent is waiting for an answer")]
    NoPendingOpponent,
}
