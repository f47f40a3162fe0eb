//! InMemory repositories.

mod difference;
mod matchmaking;
mod session;

pub use difference::InMemoryDifferenceRepository;
pub use matchmaking::InMemoryMatchmakingRepository;
pub use session::InMemorySessionRepository;
