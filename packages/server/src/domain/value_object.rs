//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Board width in pixels. Every game image has exactly this width.
pub const IMAGE_WIDTH: u32 = 640;

/// Board height in pixels. Every game image has exactly this height.
pub const IMAGE_HEIGHT: u32 = 480;

/// Client identifier value object.
///
/// Identifies one WebSocket connection. Stable for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Create a new ClientId.
    ///
    /// # Arguments
    ///
    /// * `id` - The client identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ClientId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ClientIdEmpty);
        }
        let len = id.len();
        if len > 100 {
            return Err(ValueObjectError::ClientIdTooLong {
                max: 100,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// Create a ClientId from a UUID. A hyphenated UUID always passes validation.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Game identifier value object.
///
/// Keys the persisted difference snapshot of one game, so it is restricted to
/// ASCII alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

impl GameId {
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::GameIdEmpty);
        }
        let well_formed = id.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(ValueObjectError::GameIdInvalidFormat(id));
        }
        Ok(Self(id))
    }

    /// Matchmaking key of limited-time co-op rooms. No stored game may use it.
    pub const LIMITED_TIME_LOBBY: &'static str = "limited-time";

    pub fn limited_time_lobby() -> Self {
        Self(Self::LIMITED_TIME_LOBBY.to_string())
    }

    pub fn is_limited_time_lobby(&self) -> bool {
        self.0 == Self::LIMITED_TIME_LOBBY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GameId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GameId> for String {
    fn from(value: GameId) -> Self {
        value.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::PlayerNameEmpty);
        }
        let len = trimmed.chars().count();
        if len > 32 {
            return Err(ValueObjectError::PlayerNameTooLong {
                max: 32,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric session identifier, generated by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u32);

impl SessionId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel position on the board, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Offset this coordinate, returning `None` when the result leaves the board.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        let x = self.x as i64 + dx as i64;
        let y = self.y as i64 + dy as i64;
        if (0..IMAGE_WIDTH as i64).contains(&x) && (0..IMAGE_HEIGHT as i64).contains(&y) {
            Some(Self::new(x as u32, y as u32))
        } else {
            None
        }
    }
}

/// Guess coordinates exactly as a client sent them.
///
/// Fields stay loosely typed until validated: a missing, null or non-integer
/// value deserializes to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessCoordinate {
    #[serde(default, deserialize_with = "lenient_integer")]
    pub x: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub y: Option<i64>,
}

impl GuessCoordinate {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// Convert into a board coordinate when both fields are present and in bounds.
    pub fn to_coordinate(self) -> Option<Coordinate> {
        let (x, y) = (self.x?, self.y?);
        let x = u32::try_from(x).ok().filter(|x| *x < IMAGE_WIDTH)?;
        let y = u32::try_from(y).ok().filter(|y| *y < IMAGE_HEIGHT)?;
        Some(Coordinate::new(x, y))
    }
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64())
}

/// Extension radius used by the detection engine.
///
/// Only 0, 3, 9 and 15 are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExtensionRadius(u32);

impl ExtensionRadius {
    pub const ALLOWED: [u32; 4] = [0, 3, 9, 15];

    pub fn new(radius: u32) -> Result<Self, ValueObjectError> {
        if Self::ALLOWED.contains(&radius) {
            Ok(Self(radius))
        } else {
            Err(ValueObjectError::RadiusNotAllowed(radius))
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ExtensionRadius {
    type Error = ValueObjectError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExtensionRadius> for u32 {
    fn from(value: ExtensionRadius) -> Self {
        value.0
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
