//! Common error types for failover-agent components.

use std::fmt;

/// A specialized Result type for failover-agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for failover-agent operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse failover daemon config: {0}")]
    Parse(String),

    #[error("Probe execution error: {0}")]
    Probe(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Command '{action}' failed: {stderr}")]
    CommandFailed { action: String, stderr: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new parse error.
    pub fn parse(msg: impl fmt::Display) -> Self {
        Error::Parse(msg.to_string())
    }

    /// Create a new probe execution error.
    pub fn probe(msg: impl fmt::Display) -> Self {
        Error::Probe(msg.to_string())
    }

    /// Create a new invalid-action error.
    pub fn invalid_action(name: impl fmt::Display) -> Self {
        Error::InvalidAction(name.to_string())
    }

    /// Create a new command-failed error carrying captured stderr.
    pub fn command_failed(action: impl fmt::Display, stderr: impl fmt::Display) -> Self {
        Error::CommandFailed {
            action: action.to_string(),
            stderr: stderr.to_string(),
        }
    }
}
