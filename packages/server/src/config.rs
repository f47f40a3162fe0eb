//! Command line configuration of the game server.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::GameConstants;

#[derive(Debug, Clone, Parser)]
#[command(name = "sabun-server", version, about = "Spot-the-differences game server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Directory holding one `<game-id>.json` difference file per game
    #[arg(long, default_value = "data/games")]
    pub data_dir: PathBuf,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seconds added to the clock for every clue
    #[arg(long, default_value_t = 5)]
    pub clue_penalty: u64,

    /// Initial countdown of limited-time sessions, in seconds
    #[arg(long, default_value_t = 120)]
    pub limited_time: u64,

    /// Seconds awarded per found difference in limited-time sessions
    #[arg(long, default_value_t = 5)]
    pub found_bonus: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn constants(&self) -> GameConstants {
        GameConstants {
            clue_penalty: self.clue_penalty,
            limited_time: self.limited_time,
            found_bonus: self.found_bonus,
        }
    }
}
