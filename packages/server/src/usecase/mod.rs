//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層（WebSocket ゲートウェイ）から呼び出され、Domain 層を操作します。

pub mod error;
pub mod leave_session;
pub mod matchmaking;
pub mod request_clue;
pub mod start_session;
pub mod submit_guess;

pub use error::{ClueError, GuessError, MatchmakingError, StartSessionError};
pub use leave_session::LeaveSessionUseCase;
pub use matchmaking::{MatchmakingUseCase, StartedMatchmaking};
pub use request_clue::{ClueOutcome, RequestClueUseCase};
pub use start_session::{StartSessionUseCase, StartedSession};
pub use submit_guess::{GuessOutcome, SubmitGuessUseCase};
