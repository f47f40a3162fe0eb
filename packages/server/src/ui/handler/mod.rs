//! Handler modules for HTTP and WebSocket endpoints.

mod dispatch;
pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{health_check, list_sessions, list_waiting_rooms};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
