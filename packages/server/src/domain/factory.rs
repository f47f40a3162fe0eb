//! Domain factories for creating identifiers.

use rand::Rng;

use super::value_object::{ClientId, SessionId};

/// Factory for generating SessionId instances.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Draw random ids until `is_taken` rejects none.
    pub fn generate<R, F>(rng: &mut R, is_taken: F) -> SessionId
    where
        R: Rng + ?Sized,
        F: Fn(SessionId) -> bool,
    {
        loop {
            let candidate = SessionId::new(rng.gen_range(1..=u32::MAX));
            if !is_taken(candidate) {
                return candidate;
            }
        }
    }
}

/// Factory for generating ClientId instances.
///
/// Every WebSocket connection receives a random UUID v4.
pub struct ClientIdFactory;

impl ClientIdFactory {
    pub fn generate() -> ClientId {
        ClientId::from_uuid(uuid::Uuid::new_v4())
    }
}
