//! Spot-the-differences game server.
//!
//! Serves the WebSocket game gateway and a small HTTP API.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sabun-server -- --data-dir data/games
//! ```

use clap::Parser;
use sabun_server::ServerConfig;
use sabun_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = sabun_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
