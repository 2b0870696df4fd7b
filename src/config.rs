use crate::cli::Cli;
use crate::errors::ConfigError;

use std::path::PathBuf;
use std::time::Duration;
use telnet_negotiation::{ClassifierMode, OutgoingPolicy};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2325;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Ctrl+C as it arrives from a terminal in raw mode
pub const DISCONNECT_BYTE: u8 = 0x03;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: ClassifierMode,
    pub outgoing: OutgoingPolicy,
    pub poll_interval: Duration,
    pub local_chunk_size: usize,
    pub socket_chunk_size: usize,
    pub disconnect_byte: u8,
    /// Longest a socket write may stall before the session gives up
    pub write_deadline: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub verbosity: u8,
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::Negotiate,
            outgoing: OutgoingPolicy::Raw,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            local_chunk_size: 1024,
            socket_chunk_size: 4096,
            disconnect_byte: DISCONNECT_BYTE,
            write_deadline: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// `host:port` as shown to the user
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    /// Default filter directive for the configured verbosity
    pub fn level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl TryFrom<Cli> for ClientConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.host.trim().is_empty() {
            return Err(ConfigError::invalid("host", &cli.host));
        }
        if cli.port == 0 {
            return Err(ConfigError::invalid("port", cli.port));
        }
        if cli.connect_timeout == 0 {
            return Err(ConfigError::invalid("connect_timeout", cli.connect_timeout));
        }
        if cli.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("poll_interval_ms", cli.poll_interval_ms));
        }

        let session = SessionConfig {
            mode: if cli.filter_only {
                ClassifierMode::Filter
            } else {
                ClassifierMode::Negotiate
            },
            outgoing: if cli.escape_iac {
                OutgoingPolicy::EscapeIac
            } else {
                OutgoingPolicy::Raw
            },
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
            ..SessionConfig::default()
        };

        Ok(Self {
            server: ServerConfig {
                host: cli.host,
                port: cli.port,
                connect_timeout: Duration::from_secs(cli.connect_timeout),
            },
            session,
            logging: LoggingConfig {
                verbosity: cli.verbose,
                file: cli.log_file,
            },
        })
    }
}
