//! Difference regions and the per-session lookup built on them.

use serde::{Deserialize, Serialize};

use super::{
    error::RepositoryError,
    value_object::{Coordinate, GameId, GuessCoordinate},
};

/// One connected group of differing pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifferenceRegion(Vec<Coordinate>);

impl DifferenceRegion {
    pub fn new(pixels: Vec<Coordinate>) -> Self {
        Self(pixels)
    }

    pub fn pixels(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn contains(&self, pixel: &Coordinate) -> bool {
        self.0.contains(pixel)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered list of every difference region of one game.
///
/// Serialized as an array of arrays of `{x, y}` objects. A region is
/// identified by its index in this list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifferenceSnapshot(Vec<DifferenceRegion>);

impl DifferenceSnapshot {
    pub fn new(regions: Vec<DifferenceRegion>) -> Self {
        Self(regions)
    }

    pub fn regions(&self) -> &[DifferenceRegion] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read-only difference lookup owned by one session.
#[derive(Debug, Clone)]
pub struct DifferenceStore {
    game_id: GameId,
    snapshot: DifferenceSnapshot,
}

impl DifferenceStore {
    /// Wrap a loaded snapshot. An empty snapshot cannot back a game.
    pub fn new(game_id: GameId, snapshot: DifferenceSnapshot) -> Result<Self, RepositoryError> {
        if snapshot.is_empty() || snapshot.regions().iter().any(DifferenceRegion::is_empty) {
            return Err(RepositoryError::Empty(game_id.to_string()));
        }
        Ok(Self { game_id, snapshot })
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn difference_count(&self) -> usize {
        self.snapshot.len()
    }

    /// True when both coordinates are present integers inside the board.
    pub fn validate_guess(&self, guess: &GuessCoordinate) -> bool {
        guess.to_coordinate().is_some()
    }

    /// Index of the first region containing `(x, y)`.
    pub fn check_difference(&self, x: u32, y: u32) -> Option<usize> {
        let pixel = Coordinate::new(x, y);
        self.snapshot
            .regions()
            .iter()
            .position(|region| region.contains(&pixel))
    }

    pub fn region_pixels(&self, index: usize) -> Option<&[Coordinate]> {
        self.snapshot.regions().get(index).map(DifferenceRegion::pixels)
    }

    pub fn regions(&self) -> &[DifferenceRegion] {
        self.snapshot.regions()
    }
}
