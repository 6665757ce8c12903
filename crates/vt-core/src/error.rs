//! Core error types for vehicle-term

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Transport-level errors raised by a [`Connector`](crate::traits::Connector)
/// or a [`RemoteShell`](crate::traits::RemoteShell)
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The server rejected the supplied credentials
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// TCP connection could not be established
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// A connection stage did not finish in time
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    /// Forwarded channel through the jump host could not be opened
    #[error("Tunnel error: {0}")]
    TunnelError(String),

    /// Connection was established but did not answer the canary command
    #[error("Connection test failed: expected \"connection_test\", got {0:?}")]
    CanaryMismatch(String),

    /// Connection dropped or a channel failed mid-operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Any other SSH protocol error
    #[error("SSH error: {0}")]
    Ssh(String),
}

/// Errors reported by session manager and remote file operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// The login string could not be turned into a usable host
    #[error("Invalid SSH command: {0}")]
    InvalidCommand(String),

    /// Credentials were rejected after the single prompted retry
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The password prompt was dismissed
    #[error("Password entry cancelled for {0}")]
    Cancelled(String),

    /// Network failure, timeout or failed liveness check
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No connection exists for the requested operation
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// The session is not in the state the operation requires
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Content supplied for a write is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidFormat(String),

    /// A remote command wrote non-benign output to stderr
    #[error("Remote command `{command}` failed: {stderr}")]
    RemoteCommandFailed { command: String, stderr: String },
}

impl SessionError {
    /// Build a [`SessionError::RemoteCommandFailed`], trimming the stderr text
    pub fn remote(command: impl Into<String>, stderr: &str) -> Self {
        Self::RemoteCommandFailed {
            command: command.into(),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Vehicle profile file is not valid JSON
    #[error("Vehicle profile error: {0}")]
    Profiles(#[from] serde_json::Error),

    /// Named vehicle profile does not exist
    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),
}
