//! Command-line arguments.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT,
};

/// Connect the local terminal to a Telnet server.
///
/// Keystrokes are sent to the server as typed; server output is shown with
/// Telnet negotiation stripped. Press Ctrl+C to disconnect.
#[derive(Debug, Clone, Parser)]
#[command(name = "telnet-bridge", version, about)]
pub struct Cli {
    /// Server host name or address
    #[arg(default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server TCP port
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Strip negotiation sequences without answering them
    #[arg(long)]
    pub filter_only: bool,

    /// Send typed 0xFF bytes as IAC IAC
    #[arg(long)]
    pub escape_iac: bool,

    /// Connect timeout per resolved address
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// How long each readiness wait may block
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
