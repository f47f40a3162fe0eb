//! Sabun game server library.
//!
//! Difference detection engine, game sessions, matchmaking and the real-time
//! WebSocket gateway of a spot-the-differences game.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run;
