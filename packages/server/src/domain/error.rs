//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ClientId validation error
    #[error("ClientId cannot be empty")]
    ClientIdEmpty,

    /// ClientId too long error
    #[error("ClientId cannot exceed {max} characters (got {actual})")]
    ClientIdTooLong { max: usize, actual: usize },

    /// GameId validation error
    #[error("GameId cannot be empty")]
    GameIdEmpty,

    /// GameId invalid format error (only ASCII alphanumerics, '-' and '_' are allowed)
    #[error("GameId has an invalid format (got: {0})")]
    GameIdInvalidFormat(String),

    /// PlayerName validation error
    #[error("PlayerName cannot be empty")]
    PlayerNameEmpty,

    /// PlayerName too long error
    #[error("PlayerName cannot exceed {max} characters (got {actual})")]
    PlayerNameTooLong { max: usize, actual: usize },

    /// Radius outside of the accepted set
    #[error("Extension radius {0} is not allowed (expected one of 0, 3, 9, 15)")]
    RadiusNotAllowed(u32),
}

/// Errors raised by the difference detection engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("image must be {expected_width}x{expected_height} (got {width}x{height})")]
    InvalidDimensions {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
}

/// Errors related to persisted difference snapshots
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No snapshot is stored for the game
    #[error("difference data not found for game '{0}'")]
    NotFound(String),

    /// The stored snapshot cannot be decoded
    #[error("difference data for game '{game_id}' is corrupt: {reason}")]
    Corrupt { game_id: String, reason: String },

    /// The stored snapshot holds no region
    #[error("difference data for game '{0}' is empty")]
    Empty(String),

    /// The game id is the limited-time matchmaking key
    #[error("game id '{0}' is reserved")]
    Reserved(String),

    /// Underlying storage failure
    #[error("storage error: {0}")]
    Io(String),
}

/// Errors raised by a running session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Guess coordinates are missing, not integers or out of the board
    #[error("invalid guess format: ({x:?}, {y:?})")]
    InvalidGuessFormat { x: Option<i64>, y: Option<i64> },

    /// The player is not part of the session
    #[error("player '{0}' is not part of this session")]
    PlayerNotFound(String),

    /// A session was created with the wrong number of players
    #[error("a session needs 1 or 2 players (got {0})")]
    InvalidPlayerCount(usize),

    /// No stored game is left to play
    #[error("no game available")]
    NoGameAvailable,

    /// Loading the difference data failed
    #[error(transparent)]
    Data(#[from] RepositoryError),
}
