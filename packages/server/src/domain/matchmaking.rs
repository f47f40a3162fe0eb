//! Matchmaking rooms.
//!
//! A room is opened per matchmaking request and waits for a second player of
//! the same game. Waiting rooms are kept oldest-first so newcomers always pair
//! with the player who has waited longest.

use std::fmt;

use super::value_object::{ClientId, GameId, PlayerName, Timestamp};

/// Room identifier: game id plus creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId {
    game_id: GameId,
    created_at: Timestamp,
}

impl RoomId {
    pub fn new(game_id: GameId, created_at: Timestamp) -> Self {
        Self {
            game_id,
            created_at,
        }
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.game_id, self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub client_id: ClientId,
    pub name: Option<PlayerName>,
}

impl Occupant {
    pub fn new(client_id: ClientId, name: Option<PlayerName>) -> Self {
        Self { client_id, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRoom {
    pub id: RoomId,
    pub host: Occupant,
    pub guest: Option<Occupant>,
    /// Set once the host accepted the guest
    pub accepted: bool,
}

impl MatchRoom {
    fn new(id: RoomId, host: Occupant) -> Self {
        Self {
            id,
            host,
            guest: None,
            accepted: false,
        }
    }

    pub fn game_id(&self) -> &GameId {
        self.id.game_id()
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        &self.host.client_id == client_id
            || self.guest.as_ref().is_some_and(|g| &g.client_id == client_id)
    }

    /// The occupant other than `client_id`.
    pub fn other(&self, client_id: &ClientId) -> Option<&Occupant> {
        if &self.host.client_id == client_id {
            self.guest.as_ref()
        } else {
            Some(&self.host)
        }
    }
}

/// Result of a player leaving a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The other occupant stays and the room waits again
    Requeued { remaining: Occupant },
    /// The leaver was alone, the room is gone
    Discarded,
    /// The client was not in a room of that game
    NotFound,
}

/// Waiting rooms (oldest first) and paired rooms.
#[derive(Debug, Default)]
pub struct Lobby {
    waiting: Vec<MatchRoom>,
    paired: Vec<MatchRoom>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waiting_rooms(&self) -> &[MatchRoom] {
        &self.waiting
    }

    pub fn paired_rooms(&self) -> &[MatchRoom] {
        &self.paired
    }

    /// Open a waiting room for `host`.
    pub fn start_matchmaking(
        &mut self,
        game_id: GameId,
        host: Occupant,
        created_at: Timestamp,
    ) -> RoomId {
        let id = RoomId::new(game_id, created_at);
        self.enqueue(MatchRoom::new(id.clone(), host));
        id
    }

    /// Pair `guest` with the oldest waiting room of `game_id`.
    ///
    /// No-op returning `None` when nobody waits for that game.
    pub fn join_room(&mut self, game_id: &GameId, guest: Occupant) -> Option<MatchRoom> {
        let position = self.waiting.iter().position(|room| {
            room.game_id() == game_id && room.host.client_id != guest.client_id
        })?;
        let mut room = self.waiting.remove(position);
        room.guest = Some(guest);
        self.paired.push(room.clone());
        Some(room)
    }

    /// Consolidate the two oldest single-occupant rooms of `game_id`.
    ///
    /// The newer room's host becomes the guest of the older room.
    pub fn merge_rooms_if_possible(&mut self, game_id: &GameId) -> Option<MatchRoom> {
        let mut candidates = self
            .waiting
            .iter()
            .enumerate()
            .filter(|(_, room)| room.game_id() == game_id)
            .map(|(index, _)| index);
        let older = candidates.next()?;
        let newer = candidates.find(|index| {
            self.waiting[*index].host.client_id != self.waiting[older].host.client_id
        })?;

        let newer_room = self.waiting.remove(newer);
        let mut room = self.waiting.remove(older);
        room.guest = Some(newer_room.host);
        self.paired.push(room.clone());
        Some(room)
    }

    /// Host accepts the guest of its paired room.
    pub fn accept_opponent(&mut self, host: &ClientId) -> Option<MatchRoom> {
        let room = self
            .paired
            .iter_mut()
            .find(|room| &room.host.client_id == host && room.guest.is_some())?;
        room.accepted = true;
        Some(room.clone())
    }

    /// Host turns down its guest; the room waits again.
    ///
    /// Returns the rejected guest.
    pub fn reject_opponent(&mut self, game_id: &GameId, host: &ClientId) -> Option<Occupant> {
        let position = self
            .paired
            .iter()
            .position(|room| room.game_id() == game_id && &room.host.client_id == host)?;
        let mut room = self.paired.remove(position);
        let guest = room.guest.take();
        room.accepted = false;
        self.enqueue(room);
        guest
    }

    /// `client_id` leaves its room of `game_id`, waiting or paired.
    pub fn leave_waiting_room(&mut self, game_id: &GameId, client_id: &ClientId) -> LeaveOutcome {
        if let Some(position) = self
            .waiting
            .iter()
            .position(|room| room.game_id() == game_id && room.contains(client_id))
        {
            self.waiting.remove(position);
            return LeaveOutcome::Discarded;
        }

        let Some(position) = self
            .paired
            .iter()
            .position(|room| room.game_id() == game_id && room.contains(client_id))
        else {
            return LeaveOutcome::NotFound;
        };
        let room = self.paired.remove(position);
        self.requeue_without(room, client_id)
    }

    /// `client_id` leaves whatever paired room it is in. The room is dropped.
    ///
    /// Returns the occupant left behind.
    pub fn leave_room(&mut self, client_id: &ClientId) -> Option<Occupant> {
        let position = self.paired.iter().position(|room| room.contains(client_id))?;
        let room = self.paired.remove(position);
        room.other(client_id).cloned()
    }

    /// Take the accepted room hosted or joined by `client_id` for `game_id`,
    /// removing it from the lobby.
    pub fn take_accepted(&mut self, game_id: &GameId, client_id: &ClientId) -> Option<MatchRoom> {
        let position = self.paired.iter().position(|room| {
            room.accepted && room.game_id() == game_id && room.contains(client_id)
        })?;
        Some(self.paired.remove(position))
    }

    /// Put back a room taken by [`Lobby::take_accepted`].
    ///
    /// Dropped if one of its occupants got into another room meanwhile.
    pub fn restore_accepted(&mut self, room: MatchRoom) {
        let occupied = self
            .waiting
            .iter()
            .chain(&self.paired)
            .any(|other| {
                other.contains(&room.host.client_id)
                    || room.guest.as_ref().is_some_and(|g| other.contains(&g.client_id))
            });
        if occupied {
            tracing::debug!("Room '{}' is not restored, an occupant moved on", room.id);
            return;
        }
        self.paired.push(room);
    }

    /// Remove `client_id` from every room, on disconnect.
    ///
    /// Returns the occupants that lost their opponent.
    pub fn remove_client(&mut self, client_id: &ClientId) -> Vec<Occupant> {
        self.waiting.retain(|room| !room.contains(client_id));

        let (left, kept): (Vec<MatchRoom>, Vec<MatchRoom>) = std::mem::take(&mut self.paired)
            .into_iter()
            .partition(|room| room.contains(client_id));
        self.paired = kept;

        let mut abandoned = Vec::new();
        for room in left {
            if let LeaveOutcome::Requeued { remaining } = self.requeue_without(room, client_id) {
                abandoned.push(remaining);
            }
        }
        abandoned
    }

    fn requeue_without(&mut self, mut room: MatchRoom, client_id: &ClientId) -> LeaveOutcome {
        let remaining = if &room.host.client_id == client_id {
            room.guest.take()
        } else {
            room.guest = None;
            Some(room.host.clone())
        };
        match remaining {
            Some(remaining) => {
                room.host = remaining.clone();
                room.accepted = false;
                self.enqueue(room);
                LeaveOutcome::Requeued { remaining }
            }
            None => LeaveOutcome::Discarded,
        }
    }

    /// Insert keeping the waiting list ordered by creation time.
    fn enqueue(&mut self, room: MatchRoom) {
        let position = self
            .waiting
            .partition_point(|waiting| waiting.id.created_at() <= room.id.created_at());
        self.waiting.insert(position, room);
    }
}
