use std::io;
use thiserror::Error;

/// Error types for the terminal client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not resolve or connect to the server
    #[error("could not connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Hard read/write failure on the socket or local input
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The socket stopped accepting bytes part way through a write
    #[error("short write to server: {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },

    /// Entering or leaving raw mode failed
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Invalid configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub fn invalid(key: &str, value: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
