//! Logger bootstrap shared by every binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `default_level` is applied to the
/// binary's own target and `tower_http`, and `warn` to everything else.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let target = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,{target}={default_level},sabun_server={default_level},tower_http={default_level}"
        ))
    });

    // try_init: integration tests may start several servers in one process
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
