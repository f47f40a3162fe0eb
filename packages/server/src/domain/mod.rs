//! Domain layer for the game server.
//!
//! This module contains the detection engine and the session state machines,
//! independent of data transfer objects (DTOs) and infrastructure concerns.

pub mod clue;
pub mod detection;
pub mod difference;
pub mod error;
pub mod factory;
pub mod matchmaking;
pub mod pixel_set;
pub mod repository;
pub mod session;
pub mod value_object;

pub use clue::{Clue, generate_clue};
pub use detection::{DifferenceDetector, DifferenceReport, GameClassification};
pub use difference::{DifferenceRegion, DifferenceSnapshot, DifferenceStore};
pub use error::{DetectionError, RepositoryError, SessionError, ValueObjectError};
pub use factory::{ClientIdFactory, SessionIdFactory};
pub use matchmaking::{LeaveOutcome, Lobby, MatchRoom, Occupant, RoomId};
pub use pixel_set::PixelSet;
pub use repository::{
    DeleteOutcome, DifferenceRepository, MatchmakingRepository, RegistryError, SessionBuilder,
    SessionRepository, SharedSession, load_store,
};
pub use session::{
    ClassicSession, FoundCount, GameConstants, GameSession, GuessResult, LimitedTimeSession,
    Player, Tick,
};
pub use value_object::{
    ClientId, Coordinate, ExtensionRadius, GameId, GuessCoordinate, IMAGE_HEIGHT, IMAGE_WIDTH,
    PlayerName, SessionId, Timestamp,
};
