//! Connection traits

use async_trait::async_trait;

use crate::error::ConnectionError;
use crate::types::{CommandOutput, Credentials, Endpoint};

/// An authenticated shell on a remote machine
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run a command to completion and capture its output
    async fn exec(&self, command: &str) -> Result<CommandOutput, ConnectionError>;

    /// Close the connection gracefully
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Opens [`RemoteShell`]s, either directly or through an existing shell
/// acting as a jump host
#[async_trait]
pub trait Connector: Send + Sync {
    /// The shell type produced by this connector
    type Shell: RemoteShell;

    /// Connect and authenticate directly to `endpoint`
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Shell, ConnectionError>;

    /// Open a forwarded channel from `jump` to `endpoint` and run a second
    /// SSH handshake over it
    async fn connect_through(
        &self,
        jump: &Self::Shell,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Shell, ConnectionError>;
}
