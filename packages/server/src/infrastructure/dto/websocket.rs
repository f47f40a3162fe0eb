//! WebSocket message DTOs for the game gateway.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case event name);
//! payload fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::domain::{Clue, Coordinate, FoundCount, GuessCoordinate, GuessResult};

/// Inbound events sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    StartClassicSession { game_id: String, is_solo: bool },
    #[serde(rename_all = "camelCase")]
    StartLimitedTimeSession { is_solo: bool },
    #[serde(rename_all = "camelCase")]
    SubmitGuess {
        session_id: u32,
        #[serde(default)]
        coordinate: GuessCoordinate,
    },
    RequestClue,
    #[serde(rename_all = "camelCase")]
    PlayerLeft { session_id: u32 },
    GetClientId,
    ProvideName { name: String },
    #[serde(rename_all = "camelCase")]
    StartMatchmaking { game_id: String },
    #[serde(rename_all = "camelCase")]
    JoinRoom { game_id: String, name: String },
    AcceptOpponent { name: String },
    #[serde(rename_all = "camelCase")]
    RejectOpponent { game_id: String, name: String },
    #[serde(rename_all = "camelCase")]
    LeaveWaitingRoom { game_id: String },
    LeaveRoom,
}

/// Short codes of `system-message` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemMessageCode {
    DifferenceFound,
    GuessError,
    ClueUsed,
    PlayerLeft,
    OpponentRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundCountDto {
    pub client_id: String,
    pub count: usize,
}

impl From<FoundCount> for FoundCountDto {
    fn from(found: FoundCount) -> Self {
        Self {
            client_id: found.client_id.into_string(),
            count: found.count,
        }
    }
}

/// Outbound events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    SessionId { session_id: u32 },
    #[serde(rename_all = "camelCase")]
    GuessResult {
        correct: bool,
        found_counts: Vec<FoundCountDto>,
        found_pixels: Vec<Coordinate>,
        winner: Option<String>,
        next_game: Option<String>,
    },
    TimerUpdate { clock: String },
    #[serde(rename_all = "camelCase")]
    Clue { hint: Vec<Coordinate>, clues_left: u32 },
    PlayerWon {
        winner: String,
        name: Option<String>,
    },
    OpponentLeft,
    OpponentJoined { name: String },
    RoomReachable,
    #[serde(rename_all = "camelCase")]
    SystemMessage {
        code: SystemMessageCode,
        player_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ClientId { client_id: String },
    TimeExpired,
    Error { message: String },
}

impl From<GuessResult> for ServerEvent {
    fn from(result: GuessResult) -> Self {
        Self::GuessResult {
            correct: result.correct,
            found_counts: result.found_counts.into_iter().map(Into::into).collect(),
            found_pixels: result.found_pixels,
            winner: result.winner.map(|w| w.into_string()),
            next_game: result.next_game.map(String::from),
        }
    }
}

impl From<Clue> for ServerEvent {
    fn from(clue: Clue) -> Self {
        Self::Clue {
            hint: clue.hint,
            clues_left: clue.clues_left,
        }
    }
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
