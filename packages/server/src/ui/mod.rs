//! WebSocket game server implementation.

mod handler;
mod runner;
mod signal;
pub mod state;
mod timer;

pub use runner::{build_router, run};
