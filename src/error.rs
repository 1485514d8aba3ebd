//! Error types for the delivery agent.

use std::path::PathBuf;

/// Top-level error type for one delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum MdaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl MdaError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// sysexits(3) style process status for this failure.
    ///
    /// Any nonzero status makes the fetching agent keep the message so it
    /// is handed to us again on the next poll.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Parse(_) => 65,     // EX_DATAERR
            Self::Io { .. } => 74,    // EX_IOERR
            Self::Transport(_) => 75, // EX_TEMPFAIL
            Self::Config(_) => 78,    // EX_CONFIG
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// The input could not be understood as a mail message.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty message")]
    Empty,

    #[error("No header fields found")]
    NoHeaders,

    #[error("No blank line separating headers from body")]
    NoHeaderSeparator,

    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid {header} header: {value:?}")]
    InvalidHeader { header: &'static str, value: String },
}

/// SMTP delivery to the upstream relay failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid envelope address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Failed to build envelope: {0}")]
    Envelope(String),

    #[error("SMTP send to {host} failed: {reason}")]
    SendFailed { host: String, reason: String },
}

/// Result type alias for the delivery agent.
pub type Result<T> = std::result::Result<T, MdaError>;
