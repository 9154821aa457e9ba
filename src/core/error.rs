/// Error types for the polling engine and host list

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the remote shell transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {host} failed: {reason}")]
    Connect { host: String, reason: String },

    #[error("connection to {host} timed out after {secs}s")]
    ConnectTimeout { host: String, secs: u64 },

    #[error("could not open command channel: {0}")]
    ChannelOpen(String),

    #[error("remote command failed: {0}")]
    Exec(String),

    #[error("remote command timed out after {0}s")]
    CommandTimeout(u64),
}

impl TransportError {
    /// Text shown in a metric field when its command could not produce output
    pub fn field_text(&self) -> &'static str {
        match self {
            Self::Connect { .. } | Self::ConnectTimeout { .. } => "Error: Not connected",
            Self::ChannelOpen(_) => "Error: Channel creation failed",
            Self::Exec(_) => "Error: Command execution failed",
            Self::CommandTimeout(_) => "Error: Command timed out",
        }
    }
}

/// Failures of a single host session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{host} is blocked after repeated connection failures")]
    Blocked { host: String },

    #[error("{host} is not connected")]
    NotConnected { host: String },

    #[error(transparent)]
    Connect(#[from] TransportError),
}

/// Failures of the persisted host list
#[derive(Debug, Error)]
pub enum HostListError {
    #[error("Host {0} already exists.")]
    Duplicate(String),

    #[error("Host {0} not found.")]
    NotFound(String),

    #[error("Invalid host name {0:?}: must be non-empty and contain no whitespace")]
    Invalid(String),

    #[error("Could not determine config directory: {0}")]
    Location(String),

    #[error("Failed to access host list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
