//! Live game sessions.
//!
//! A [`GameSession`] is either a classic match on one fixed game or a
//! limited-time match rotating through games. Both share [`SessionState`],
//! which owns the guess / clue / clock bookkeeping.

use rand::seq::SliceRandom;
use sabun_shared::time::format_clock;

use super::{
    difference::{DifferenceRegion, DifferenceStore},
    error::SessionError,
    repository::DifferenceRepository,
    value_object::{ClientId, Coordinate, GameId, GuessCoordinate, PlayerName, SessionId},
};

/// Clue requests allowed per session
pub const MAX_CLUES: u32 = 2;

/// Tunable time rules, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConstants {
    /// Added to the clock for every granted clue
    pub clue_penalty: u64,
    /// Initial countdown of a limited-time session
    pub limited_time: u64,
    /// Added to the limited-time countdown per found difference
    pub found_bonus: u64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            clue_penalty: 5,
            limited_time: 120,
            found_bonus: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub client_id: ClientId,
    pub name: Option<PlayerName>,
    /// Region indices found in the current game
    found: Vec<usize>,
    /// Found differences over the whole session
    total_found: usize,
}

impl Player {
    pub fn new(client_id: ClientId, name: Option<PlayerName>) -> Self {
        Self {
            client_id,
            name,
            found: Vec::new(),
            total_found: 0,
        }
    }

    pub fn found(&self) -> &[usize] {
        &self.found
    }

    pub fn total_found(&self) -> usize {
        self.total_found
    }
}

/// Running found count of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundCount {
    pub client_id: ClientId,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessResult {
    pub correct: bool,
    /// In player order
    pub found_counts: Vec<FoundCount>,
    /// Pixels of the found region, empty on a miss
    pub found_pixels: Vec<Coordinate>,
    pub winner: Option<ClientId>,
    /// Game loaded by a limited-time rotation
    pub next_game: Option<GameId>,
}

/// Clock state after one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub clock: String,
    pub expired: bool,
}

/// State shared by both session kinds.
#[derive(Debug)]
pub struct SessionState {
    session_id: SessionId,
    store: DifferenceStore,
    elapsed: u64,
    guesses: u32,
    penalties: u32,
    clue_requests: u32,
    /// Differences found over the whole session, by every player who took part
    total_found: usize,
    players: Vec<Player>,
    constants: GameConstants,
}

impl SessionState {
    fn new(
        session_id: SessionId,
        store: DifferenceStore,
        players: Vec<Player>,
        constants: GameConstants,
    ) -> Result<Self, SessionError> {
        if !(1..=2).contains(&players.len()) {
            return Err(SessionError::InvalidPlayerCount(players.len()));
        }
        Ok(Self {
            session_id,
            store,
            elapsed: 0,
            guesses: 0,
            penalties: 0,
            clue_requests: 0,
            total_found: 0,
            players,
            constants,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn game_id(&self) -> &GameId {
        self.store.game_id()
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    pub fn penalties(&self) -> u32 {
        self.penalties
    }

    pub fn clue_requests(&self) -> u32 {
        self.clue_requests
    }

    pub fn total_found(&self) -> usize {
        self.total_found
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.players.iter().map(|p| p.client_id.clone()).collect()
    }

    pub fn has_player(&self, client_id: &ClientId) -> bool {
        self.players.iter().any(|p| &p.client_id == client_id)
    }

    pub fn is_solo(&self) -> bool {
        self.players.len() == 1
    }

    pub fn difference_count(&self) -> usize {
        self.store.difference_count()
    }

    pub fn set_player_name(&mut self, client_id: &ClientId, name: PlayerName) -> bool {
        match self.players.iter_mut().find(|p| &p.client_id == client_id) {
            Some(player) => {
                player.name = Some(name);
                true
            }
            None => false,
        }
    }

    fn is_found(&self, index: usize) -> bool {
        self.players.iter().any(|p| p.found.contains(&index))
    }

    /// Validate the guess and resolve it to a region nobody has found yet.
    ///
    /// Never mutates the session.
    fn locate(
        &self,
        guess: &GuessCoordinate,
        client_id: &ClientId,
    ) -> Result<Option<usize>, SessionError> {
        if !self.has_player(client_id) {
            return Err(SessionError::PlayerNotFound(client_id.to_string()));
        }
        let invalid = SessionError::InvalidGuessFormat {
            x: guess.x,
            y: guess.y,
        };
        if !self.store.validate_guess(guess) {
            return Err(invalid);
        }
        let pixel = guess.to_coordinate().ok_or(invalid)?;
        Ok(self
            .store
            .check_difference(pixel.x, pixel.y)
            .filter(|index| !self.is_found(*index)))
    }

    /// Apply a located guess and build its result without a winner.
    fn record(&mut self, client_id: &ClientId, region: Option<usize>) -> GuessResult {
        let found_pixels = match region {
            Some(index) => {
                if let Some(player) = self.players.iter_mut().find(|p| &p.client_id == client_id) {
                    player.found.push(index);
                    player.total_found += 1;
                }
                self.total_found += 1;
                self.guesses += 1;
                self.store
                    .region_pixels(index)
                    .map(<[Coordinate]>::to_vec)
                    .unwrap_or_default()
            }
            None => {
                self.penalties += 1;
                Vec::new()
            }
        };
        GuessResult {
            correct: region.is_some(),
            found_counts: self.found_counts(),
            found_pixels,
            winner: None,
            next_game: None,
        }
    }

    pub fn found_counts(&self) -> Vec<FoundCount> {
        self.players
            .iter()
            .map(|p| FoundCount {
                client_id: p.client_id.clone(),
                count: p.total_found,
            })
            .collect()
    }

    /// Charge a clue to the session clock. Refused from the third request on.
    pub fn handle_clue_request(&mut self) -> bool {
        if self.clue_requests >= MAX_CLUES {
            return false;
        }
        self.clue_requests += 1;
        self.elapsed += self.constants.clue_penalty;
        true
    }

    pub fn clues_left(&self) -> u32 {
        MAX_CLUES.saturating_sub(self.clue_requests)
    }

    /// Regions of the current game nobody has found, with their indices.
    pub fn not_found_differences(&self) -> Vec<(usize, &DifferenceRegion)> {
        self.store
            .regions()
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_found(*index))
            .collect()
    }

    fn replace_game(&mut self, store: DifferenceStore) {
        self.store = store;
        for player in &mut self.players {
            player.found.clear();
        }
    }
}

/// A timed match on a single game, solo or one-versus-one.
#[derive(Debug)]
pub struct ClassicSession {
    state: SessionState,
}

impl ClassicSession {
    pub fn new(
        session_id: SessionId,
        store: DifferenceStore,
        players: Vec<Player>,
        constants: GameConstants,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            state: SessionState::new(session_id, store, players, constants)?,
        })
    }

    pub fn try_guess(
        &mut self,
        guess: &GuessCoordinate,
        client_id: &ClientId,
    ) -> Result<GuessResult, SessionError> {
        let region = self.state.locate(guess, client_id)?;
        let mut result = self.state.record(client_id, region);
        result.winner = self.verify_game_won();
        Ok(result)
    }

    /// Solo: every region found. Multiplayer: strictly more than half.
    pub fn verify_game_won(&self) -> Option<ClientId> {
        let total = self.state.difference_count();
        let solo = self.state.is_solo();
        self.state
            .players
            .iter()
            .find(|p| {
                if solo {
                    p.found.len() == total
                } else {
                    p.found.len() * 2 > total
                }
            })
            .map(|p| p.client_id.clone())
    }

    fn tick(&mut self) -> Tick {
        self.state.elapsed += 1;
        Tick {
            clock: format_clock(self.state.elapsed),
            expired: false,
        }
    }
}

/// A countdown match that loads a new game after every found difference.
#[derive(Debug)]
pub struct LimitedTimeSession {
    state: SessionState,
    played_games: Vec<GameId>,
    finished: bool,
}

impl LimitedTimeSession {
    /// Pick the first game of a new session at random.
    pub async fn first_game(
        repository: &dyn DifferenceRepository,
    ) -> Result<DifferenceStore, SessionError> {
        next_store(repository, &[])
            .await?
            .ok_or(SessionError::NoGameAvailable)
    }

    pub fn new(
        session_id: SessionId,
        store: DifferenceStore,
        players: Vec<Player>,
        constants: GameConstants,
    ) -> Result<Self, SessionError> {
        let played_games = vec![store.game_id().clone()];
        Ok(Self {
            state: SessionState::new(session_id, store, players, constants)?,
            played_games,
            finished: false,
        })
    }

    pub fn played_games(&self) -> &[GameId] {
        &self.played_games
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Seconds left on the countdown. Finds of a player who left still count.
    pub fn remaining(&self) -> u64 {
        let budget = self.state.constants.limited_time
            + self.state.constants.found_bonus * self.state.total_found as u64;
        budget.saturating_sub(self.state.elapsed)
    }

    /// Load an unplayed game. `None` once every stored game has been played.
    pub async fn decide_new_game(
        &mut self,
        repository: &dyn DifferenceRepository,
    ) -> Result<Option<GameId>, SessionError> {
        let Some(store) = next_store(repository, &self.played_games).await? else {
            return Ok(None);
        };
        Ok(Some(self.switch_to(store)))
    }

    fn switch_to(&mut self, store: DifferenceStore) -> GameId {
        let game_id = store.game_id().clone();
        self.state.replace_game(store);
        self.played_games.push(game_id.clone());
        game_id
    }

    /// A correct guess rotates to a new game. When no game is left the
    /// guessing player is reported as winner and the session is finished.
    pub async fn try_guess(
        &mut self,
        guess: &GuessCoordinate,
        client_id: &ClientId,
        repository: &dyn DifferenceRepository,
    ) -> Result<GuessResult, SessionError> {
        let region = self.state.locate(guess, client_id)?;
        // the next game is resolved before anything is recorded, so a storage
        // error leaves the session untouched
        let next = match region {
            Some(_) => Some(next_store(repository, &self.played_games).await?),
            None => None,
        };

        let mut result = self.state.record(client_id, region);
        match next {
            Some(Some(store)) => result.next_game = Some(self.switch_to(store)),
            Some(None) => {
                self.finished = true;
                result.winner = Some(client_id.clone());
            }
            None => {}
        }
        Ok(result)
    }

    /// Drop a disconnecting player; the remaining player keeps playing.
    /// Returns the number of players left.
    pub fn delete_player(&mut self, client_id: &ClientId) -> usize {
        self.state.players.retain(|p| &p.client_id != client_id);
        self.state.players.len()
    }

    fn tick(&mut self) -> Tick {
        self.state.elapsed += 1;
        let remaining = self.remaining();
        if remaining == 0 {
            self.finished = true;
        }
        Tick {
            clock: format_clock(remaining),
            expired: remaining == 0,
        }
    }
}

async fn next_store(
    repository: &dyn DifferenceRepository,
    played: &[GameId],
) -> Result<Option<DifferenceStore>, SessionError> {
    let mut candidates: Vec<GameId> = repository
        .list_games()
        .await?
        .into_iter()
        .filter(|game_id| !played.contains(game_id))
        .collect();
    candidates.shuffle(&mut rand::thread_rng());

    for game_id in candidates {
        let loaded = repository
            .load(&game_id)
            .await
            .and_then(|snapshot| DifferenceStore::new(game_id.clone(), snapshot));
        match loaded {
            Ok(store) => return Ok(Some(store)),
            Err(e) => tracing::warn!("Skipping game '{}' in rotation: {}", game_id, e),
        }
    }
    Ok(None)
}

#[derive(Debug)]
pub enum GameSession {
    Classic(ClassicSession),
    LimitedTime(LimitedTimeSession),
}

impl GameSession {
    pub fn state(&self) -> &SessionState {
        match self {
            Self::Classic(session) => &session.state,
            Self::LimitedTime(session) => &session.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        match self {
            Self::Classic(session) => &mut session.state,
            Self::LimitedTime(session) => &mut session.state,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.state().session_id()
    }

    pub fn is_limited_time(&self) -> bool {
        matches!(self, Self::LimitedTime(_))
    }

    pub async fn try_guess(
        &mut self,
        guess: &GuessCoordinate,
        client_id: &ClientId,
        repository: &dyn DifferenceRepository,
    ) -> Result<GuessResult, SessionError> {
        match self {
            Self::Classic(session) => session.try_guess(guess, client_id),
            Self::LimitedTime(session) => session.try_guess(guess, client_id, repository).await,
        }
    }

    /// Limited-time only: drop a player and return how many are left.
    pub fn delete_player(&mut self, client_id: &ClientId) -> Option<usize> {
        match self {
            Self::Classic(_) => None,
            Self::LimitedTime(session) => Some(session.delete_player(client_id)),
        }
    }

    pub fn handle_clue_request(&mut self) -> bool {
        self.state_mut().handle_clue_request()
    }

    pub fn tick(&mut self) -> Tick {
        match self {
            Self::Classic(session) => session.tick(),
            Self::LimitedTime(session) => session.tick(),
        }
    }
}
