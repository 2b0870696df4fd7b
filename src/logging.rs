//! Logging setup.
//!
//! Logs go to stderr unless a log file is configured. While the terminal is in
//! raw mode stderr shares the screen with server output, so anything chattier
//! than warnings is best sent to a file.

use crate::config::LoggingConfig;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `RUST_LOG` wins, otherwise the configured verbosity
/// applied to this workspace's crates.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.level();
        EnvFilter::new(format!("telnet_bridge={level},telnet_negotiation={level}"))
    })
}

/// Install the global subscriber.
///
/// # Errors
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> io::Result<()> {
    let filter = env_filter(config);

    match &config.file {
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .try_init()
            .map_err(|e| io::Error::other(e.to_string())),
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .map_err(|e| io::Error::other(e.to_string()))
        }
    }
}
