//! russh-backed [`Connector`] and [`RemoteShell`]
//!
//! Every connection goes through the same three timed stages: open a byte
//! stream (TCP, or a `direct-tcpip` channel on the jump host), run the SSH
//! handshake over it, then authenticate with a password.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use vt_core::config::SshSettings;
use vt_core::traits::{Connector, RemoteShell};
use vt_core::types::{CommandOutput, Credentials, Endpoint};
use vt_core::ConnectionError;

/// SSH extended data stream number for stderr
const STDERR_STREAM: u32 = 1;

/// Per-stage connection timeouts
#[derive(Debug, Clone, Copy)]
pub struct SshTimeouts {
    pub connect: Duration,
    pub banner: Duration,
    pub auth: Duration,
}

impl From<&SshSettings> for SshTimeouts {
    fn from(settings: &SshSettings) -> Self {
        Self {
            connect: settings.connect_timeout,
            banner: settings.banner_timeout,
            auth: settings.auth_timeout,
        }
    }
}

/// Opens password-authenticated SSH sessions
pub struct SshConnector {
    config: Arc<Config>,
    timeouts: SshTimeouts,
}

impl SshConnector {
    pub fn new(timeouts: SshTimeouts) -> Self {
        Self {
            config: Arc::new(Config::default()),
            timeouts,
        }
    }

    pub fn from_settings(settings: &SshSettings) -> Self {
        Self::new(SshTimeouts::from(settings))
    }

    /// Handshake and authenticate over an already-open byte stream
    async fn establish<S>(
        &self,
        stream: S,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<SshShell, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let handler = ClientHandler::new(endpoint.to_string());

        let mut handle = within(
            "SSH banner exchange",
            self.timeouts.banner,
            client::connect_stream(Arc::clone(&self.config), stream, handler),
        )
        .await?
        .map_err(|e| ConnectionError::Ssh(format!("handshake with {} failed: {}", endpoint, e)))?;

        tracing::debug!("Authenticating to {} as '{}'", endpoint, credentials.username);
        let username = credentials.username.clone();
        let authenticated = match credentials.password.clone() {
            Some(password) => {
                within(
                    "Authentication",
                    self.timeouts.auth,
                    handle.authenticate_password(username, password),
                )
                .await?
            }
            None => {
                within(
                    "Authentication",
                    self.timeouts.auth,
                    handle.authenticate_none(username),
                )
                .await?
            }
        }
        .map_err(|e| ConnectionError::Ssh(format!("authentication error: {}", e)))?;

        if !authenticated {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "authentication failed", "en")
                .await;
            return Err(ConnectionError::AuthenticationFailed);
        }

        tracing::info!("SSH session established to {}@{}", credentials.username, endpoint);
        Ok(SshShell {
            handle,
            label: format!("{}@{}", credentials.username, endpoint),
        })
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Shell = SshShell;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<SshShell, ConnectionError> {
        tracing::debug!("Connecting to {}", endpoint);
        let stream = within(
            "TCP connect",
            self.timeouts.connect,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await?
        .map_err(|e| ConnectionError::ConnectionRefused(format!("{}: {}", endpoint, e)))?;

        self.establish(stream, endpoint, credentials).await
    }

    async fn connect_through(
        &self,
        jump: &SshShell,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<SshShell, ConnectionError> {
        tracing::debug!("Opening direct-tcpip channel via {} to {}", jump.label, endpoint);
        let channel = within(
            "Tunnel open",
            self.timeouts.connect,
            jump.handle.channel_open_direct_tcpip(
                endpoint.host.clone(),
                u32::from(endpoint.port),
                "127.0.0.1",
                0,
            ),
        )
        .await?
        .map_err(|e| ConnectionError::TunnelError(format!("{} via {}: {}", endpoint, jump.label, e)))?;

        self.establish(channel.into_stream(), endpoint, credentials)
            .await
    }
}

/// An authenticated SSH session
pub struct SshShell {
    handle: Handle<ClientHandler>,
    label: String,
}

impl SshShell {
    /// `user@host:port` of this session
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn exec(&self, command: &str) -> Result<CommandOutput, ConnectionError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ConnectionError::ConnectionLost(format!("{}: {}", self.label, e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ConnectionError::ConnectionLost(format!("{}: {}", self.label, e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == STDERR_STREAM => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                _ => {}
            }
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        if self.handle.is_closed() {
            return Ok(());
        }
        self.handle
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
            .map_err(|e| ConnectionError::Ssh(e.to_string()))
    }
}

/// Await `future`, failing with [`ConnectionError::Timeout`] after `limit`
async fn within<F: Future>(
    stage: &'static str,
    limit: Duration,
    future: F,
) -> Result<F::Output, ConnectionError> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| ConnectionError::Timeout { stage, after: limit })
}

/// SSH client handler
///
/// Accepts any host key and logs its fingerprint.
struct ClientHandler {
    endpoint: String,
}

impl ClientHandler {
    fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            "Host key for {}: {}",
            self.endpoint,
            server_public_key.fingerprint()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_from_settings() {
        let settings = SshSettings {
            connect_timeout: Duration::from_secs(3),
            auth_timeout: Duration::from_secs(4),
            banner_timeout: Duration::from_secs(5),
            ..SshSettings::default()
        };
        let timeouts = SshTimeouts::from(&settings);
        assert_eq!(timeouts.connect, Duration::from_secs(3));
        assert_eq!(timeouts.auth, Duration::from_secs(4));
        assert_eq!(timeouts.banner, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let result = within(
            "TCP connect",
            Duration::from_millis(10),
            std::future::pending::<()>(),
        )
        .await;
        assert!(matches!(
            result,
            Err(ConnectionError::Timeout { stage: "TCP connect", .. })
        ));
    }

    #[tokio::test]
    async fn test_within_passes_output_through() {
        let result = within("x", Duration::from_secs(1), async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = SshConnector::from_settings(&SshSettings::default());
        let result = connector
            .connect(
                &Endpoint::new("127.0.0.1", port),
                &Credentials::new("root", Some("pw".to_string())),
            )
            .await;
        assert!(matches!(result, Err(ConnectionError::ConnectionRefused(_))));
    }
}
