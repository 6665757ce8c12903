//! Vehicle session manager
//!
//! Owns at most one vehicle-level link and at most one side connection.
//! The vehicle link is either a live jump-host connection or a "direct"
//! marker meaning the sides are reached without a jump host. A side
//! connection needs one of the two; opening a new side connection always
//! closes the previous one first.

use std::mem;

use async_trait::async_trait;

use vt_core::config::Settings;
use vt_core::traits::{CommandExecutor, Connector, PasswordPrompt, RemoteShell};
use vt_core::types::{CommandOutput, Credentials, Endpoint, PromptContext, RemoteFileKind, Side};
use vt_core::{ConnectionError, SessionError};

use crate::login::parse_login;
use crate::transfer::{FileStatus, RemoteFiles, WriteReport};

/// Liveness check run after connecting to a jump host
const CANARY_COMMAND: &str = "echo \"connection_test\"";
const CANARY_OUTPUT: &str = "connection_test";

const VEHICLE_PROBE: &str = "pwd && whoami";
const SIDE_PROBE: &str = "pwd && whoami && ls -la";

enum VehicleLink<S> {
    Disconnected,
    /// Vehicle selected, sides are reached directly
    Direct,
    /// Live jump-host connection
    Jump(S),
}

struct SideLink<S> {
    side: Side,
    ip: String,
    username: String,
    shell: S,
}

/// How a connection attempt reaches its endpoint
#[derive(Debug, Clone, Copy)]
enum Route {
    /// Straight to a jump host, verified with the canary command
    Vehicle,
    /// Forwarded through the live jump host
    Tunnel,
}

/// Snapshot of the session plus the output of probe commands
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub car_name: Option<String>,
    pub host: Option<String>,
    pub direct_mode: bool,
    pub side: Option<Side>,
    pub side_ip: Option<String>,
    pub side_username: Option<String>,
    pub working_directory: String,
    /// `pwd && whoami` on the jump host, if one is connected
    pub vehicle_probe: Option<Result<String, String>>,
    /// `pwd && whoami && ls -la` on the side, if one is connected
    pub side_probe: Option<Result<String, String>>,
}

/// Owns the SSH connections to one vehicle and its selected side
pub struct SessionManager<C: Connector> {
    connector: C,
    settings: Settings,
    prompt: Box<dyn PasswordPrompt>,
    vehicle: VehicleLink<C::Shell>,
    side: Option<SideLink<C::Shell>>,
    car_name: Option<String>,
    host: Option<String>,
    working_directory: String,
}

impl<C: Connector> SessionManager<C> {
    /// Create an empty session
    pub fn new(connector: C, settings: Settings, prompt: impl PasswordPrompt + 'static) -> Self {
        let working_directory = settings.remote.default_working_directory.clone();
        Self {
            connector,
            settings,
            prompt: Box::new(prompt),
            vehicle: VehicleLink::Disconnected,
            side: None,
            car_name: None,
            host: None,
            working_directory,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set the working directory; `None` or blank restores the default
    pub fn set_working_directory(&mut self, working_directory: Option<&str>) {
        self.working_directory = match working_directory.map(str::trim) {
            Some(dir) if !dir.is_empty() => dir.to_string(),
            _ => self.settings.remote.default_working_directory.clone(),
        };
        tracing::debug!("Working directory: {}", self.working_directory);
    }

    /// Connect to a vehicle's jump host described by a login string
    ///
    /// Tries the configured default password first and asks the prompt once
    /// if it is rejected. Previous connections are closed only after the new
    /// one is up.
    pub async fn connect_to_vehicle(
        &mut self,
        car_name: &str,
        login: &str,
        port: u16,
        working_directory: Option<&str>,
    ) -> Result<String, SessionError> {
        let target = parse_login(login, &self.settings.ssh.default_username)?;
        let endpoint = Endpoint::new(target.host.clone(), port);
        let default_password = Some(self.settings.ssh.default_password.clone())
            .filter(|p| !p.is_empty());

        tracing::info!(
            "Connecting to vehicle {} ({}@{})",
            car_name,
            target.username,
            endpoint
        );

        let shell = self
            .open_with_prompt(
                Route::Vehicle,
                "vehicle",
                &endpoint,
                &target.username,
                default_password,
            )
            .await?;

        self.teardown().await;
        self.vehicle = VehicleLink::Jump(shell);
        self.car_name = Some(car_name.to_string());
        self.host = Some(target.host.clone());
        self.set_working_directory(working_directory);

        tracing::info!("Connected to vehicle {}", car_name);
        Ok(format!(
            "Connected to vehicle {} ({}@{})",
            car_name, target.username, target.host
        ))
    }

    /// Select a vehicle whose sides are reached without a jump host
    pub async fn prepare_direct_vehicle(
        &mut self,
        car_name: &str,
        working_directory: Option<&str>,
    ) -> String {
        self.disconnect().await;
        self.vehicle = VehicleLink::Direct;
        self.car_name = Some(car_name.to_string());
        self.set_working_directory(working_directory);

        tracing::info!(
            "Direct mode for vehicle {}, working directory {}",
            car_name,
            self.working_directory
        );
        format!("Selected vehicle {} (direct mode)", car_name)
    }

    /// Connect straight to a side; requires direct mode
    ///
    /// Missing credentials come from the `[sides]` settings. There is no
    /// password prompt on this path.
    pub async fn connect_to_side_direct(
        &mut self,
        side: Side,
        ip: &str,
        username: Option<&str>,
        password: Option<&str>,
        port: u16,
    ) -> Result<String, SessionError> {
        if !matches!(self.vehicle, VehicleLink::Direct) {
            return Err(SessionError::PreconditionFailed(
                "direct mode is not enabled for this session".to_string(),
            ));
        }

        let username = non_blank(username)
            .unwrap_or_else(|| self.settings.sides.username(side))
            .to_string();
        let password = non_blank(password)
            .or_else(|| self.settings.sides.password(side))
            .map(str::to_string);

        self.close_side().await;

        let endpoint = Endpoint::new(ip, port);
        tracing::info!("Connecting directly to side {} ({}@{})", side, username, endpoint);

        let shell = self
            .connector
            .connect(&endpoint, &Credentials::new(username.clone(), password))
            .await
            .map_err(|e| match e {
                ConnectionError::AuthenticationFailed => SessionError::AuthenticationFailed(
                    format!("side {} ({}@{})", side, username, ip),
                ),
                other => SessionError::ConnectionFailed(format!("side {}: {}", side, other)),
            })?;

        self.side = Some(SideLink {
            side,
            ip: ip.to_string(),
            username: username.clone(),
            shell,
        });
        self.host = Some(ip.to_string());

        Ok(format!("Connected directly to side {} ({}@{})", side, username, ip))
    }

    /// Disconnect, select `car_name` in direct mode and open `side`
    #[allow(clippy::too_many_arguments)]
    pub async fn connect_headunit_direct(
        &mut self,
        car_name: &str,
        side: Side,
        ip: &str,
        username: Option<&str>,
        password: Option<&str>,
        port: u16,
        working_directory: Option<&str>,
    ) -> Result<String, SessionError> {
        self.prepare_direct_vehicle(car_name, working_directory).await;
        self.connect_to_side_direct(side, ip, username, password, port)
            .await
    }

    /// Connect to a side through the jump host
    pub async fn connect_to_side_tunnel(
        &mut self,
        side: Side,
        ip: &str,
        username: Option<&str>,
        port: u16,
    ) -> Result<String, SessionError> {
        match self.vehicle {
            VehicleLink::Disconnected => {
                return Err(SessionError::NotConnected(
                    "connect to a vehicle before selecting a side".to_string(),
                ))
            }
            VehicleLink::Direct => {
                return Err(SessionError::PreconditionFailed(
                    "vehicle is in direct mode, there is no jump host to tunnel through"
                        .to_string(),
                ))
            }
            VehicleLink::Jump(_) => {}
        }

        let username = non_blank(username)
            .unwrap_or_else(|| self.settings.sides.username(side))
            .to_string();
        let default_password = self.settings.sides.password(side).map(str::to_string);

        self.close_side().await;

        let endpoint = Endpoint::new(ip, port);
        tracing::info!("Connecting to side {} ({}@{}) through tunnel", side, username, endpoint);

        let label = format!("side {}", side);
        let shell = self
            .open_with_prompt(Route::Tunnel, &label, &endpoint, &username, default_password)
            .await?;

        self.side = Some(SideLink {
            side,
            ip: ip.to_string(),
            username: username.clone(),
            shell,
        });

        Ok(format!("Connected to side {} ({}@{}) through tunnel", side, username, ip))
    }

    /// Run a command on the connected side and return its stdout
    pub async fn execute_side_command(&self, command: &str) -> Result<String, SessionError> {
        let link = self.require_side()?;
        let output = link
            .shell
            .exec(command)
            .await
            .map_err(|e| SessionError::ConnectionFailed(format!("side {}: {}", link.side, e)))?;

        self.check_output(command, output)
    }

    /// Run a command on the jump host and return its stdout
    pub async fn execute_vehicle_command(&self, command: &str) -> Result<String, SessionError> {
        let shell = match &self.vehicle {
            VehicleLink::Jump(shell) => shell,
            VehicleLink::Direct => {
                return Err(SessionError::PreconditionFailed(
                    "vehicle is in direct mode, there is no jump host".to_string(),
                ))
            }
            VehicleLink::Disconnected => {
                return Err(SessionError::NotConnected("no vehicle connection".to_string()))
            }
        };

        let output = shell
            .exec(command)
            .await
            .map_err(|e| SessionError::ConnectionFailed(format!("vehicle: {}", e)))?;

        self.check_output(command, output)
    }

    /// Remote file operations on the connected side
    pub fn files(&self) -> RemoteFiles<'_, Self> {
        RemoteFiles::new(self, &self.settings, &self.working_directory)
    }

    pub async fn read_file(&self, kind: RemoteFileKind) -> Result<String, SessionError> {
        self.files().read(kind).await
    }

    pub async fn write_file(
        &self,
        kind: RemoteFileKind,
        content: &str,
    ) -> Result<WriteReport, SessionError> {
        self.files().write(kind, content).await
    }

    /// Resolve a file on the connected side and report where it is
    pub async fn check_file(&self, kind: RemoteFileKind) -> Result<FileStatus, SessionError> {
        self.require_side()?;
        Ok(self.files().check(kind).await)
    }

    /// Run the configured remount command on the connected side
    pub async fn mount_filesystem(&self) -> Result<(), SessionError> {
        self.files().mount().await
    }

    /// Report session state and probe each live connection
    pub async fn diagnose(&self) -> Diagnostics {
        let vehicle_probe = if matches!(self.vehicle, VehicleLink::Jump(_)) {
            Some(
                self.execute_vehicle_command(VEHICLE_PROBE)
                    .await
                    .map_err(|e| e.to_string()),
            )
        } else {
            None
        };

        let side_probe = if self.side.is_some() {
            Some(
                self.execute_side_command(SIDE_PROBE)
                    .await
                    .map_err(|e| e.to_string()),
            )
        } else {
            None
        };

        Diagnostics {
            car_name: self.car_name.clone(),
            host: self.host.clone(),
            direct_mode: self.is_direct_mode(),
            side: self.current_side(),
            side_ip: self.current_side_ip().map(str::to_string),
            side_username: self.current_side_username().map(str::to_string),
            working_directory: self.working_directory.clone(),
            vehicle_probe,
            side_probe,
        }
    }

    /// Close all connections and reset the session. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        self.teardown().await;
        self.car_name = None;
        self.host = None;
        self.working_directory = self.settings.remote.default_working_directory.clone();
        tracing::info!("Session disconnected");
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self.vehicle, VehicleLink::Disconnected)
    }

    pub fn is_side_connected(&self) -> bool {
        self.side.is_some()
    }

    pub fn is_direct_mode(&self) -> bool {
        matches!(self.vehicle, VehicleLink::Direct)
    }

    pub fn current_car_name(&self) -> Option<&str> {
        self.car_name.as_deref()
    }

    pub fn current_side(&self) -> Option<Side> {
        self.side.as_ref().map(|link| link.side)
    }

    pub fn current_side_ip(&self) -> Option<&str> {
        self.side.as_ref().map(|link| link.ip.as_str())
    }

    pub fn current_side_username(&self) -> Option<&str> {
        self.side.as_ref().map(|link| link.username.as_str())
    }

    /// Jump host, or the side address in direct mode
    pub fn current_host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn current_working_directory(&self) -> &str {
        &self.working_directory
    }

    /// Connect with the default password, prompting once on rejection
    async fn open_with_prompt(
        &self,
        route: Route,
        target: &str,
        endpoint: &Endpoint,
        username: &str,
        default_password: Option<String>,
    ) -> Result<C::Shell, SessionError> {
        let first = Credentials::new(username, default_password);
        match self.open(route, endpoint, &first).await {
            Ok(shell) => return Ok(shell),
            Err(ConnectionError::AuthenticationFailed) => {
                tracing::warn!(
                    "Default password rejected for {}@{}, asking for password",
                    username,
                    endpoint
                );
            }
            Err(e) => {
                tracing::error!("Connecting to {} failed: {}", endpoint, e);
                return Err(SessionError::ConnectionFailed(e.to_string()));
            }
        }

        let context = PromptContext {
            target: target.to_string(),
            username: username.to_string(),
            host: endpoint.host.clone(),
        };
        let password = self
            .prompt
            .prompt_password(&context)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SessionError::Cancelled(context.to_string()))?;

        let retry = Credentials::new(username, Some(password));
        self.open(route, endpoint, &retry).await.map_err(|e| match e {
            ConnectionError::AuthenticationFailed => {
                tracing::error!("Password rejected for {}", context);
                SessionError::AuthenticationFailed(format!("password rejected for {}", context))
            }
            other => {
                tracing::error!("Connecting to {} failed: {}", endpoint, other);
                SessionError::ConnectionFailed(other.to_string())
            }
        })
    }

    async fn open(
        &self,
        route: Route,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<C::Shell, ConnectionError> {
        match route {
            Route::Vehicle => {
                let shell = self.connector.connect(endpoint, credentials).await?;
                if let Err(e) = self.verify_liveness(&shell).await {
                    let _ = shell.close().await;
                    return Err(e);
                }
                Ok(shell)
            }
            Route::Tunnel => {
                let VehicleLink::Jump(jump) = &self.vehicle else {
                    return Err(ConnectionError::TunnelError(
                        "no jump host connection".to_string(),
                    ));
                };
                self.connector
                    .connect_through(jump, endpoint, credentials)
                    .await
            }
        }
    }

    async fn verify_liveness(&self, shell: &C::Shell) -> Result<(), ConnectionError> {
        let limit = self.settings.ssh.liveness_timeout;
        let output = tokio::time::timeout(limit, shell.exec(CANARY_COMMAND))
            .await
            .map_err(|_| ConnectionError::Timeout {
                stage: "Connection test",
                after: limit,
            })??;

        let answer = output.stdout.trim();
        if answer == CANARY_OUTPUT {
            Ok(())
        } else {
            Err(ConnectionError::CanaryMismatch(answer.to_string()))
        }
    }

    fn require_side(&self) -> Result<&SideLink<C::Shell>, SessionError> {
        self.side
            .as_ref()
            .ok_or_else(|| SessionError::NotConnected("no side connection".to_string()))
    }

    fn check_output(&self, command: &str, output: CommandOutput) -> Result<String, SessionError> {
        if self.settings.stderr.is_failure(&output.stderr) {
            tracing::warn!("Command `{}` wrote to stderr: {}", command, output.stderr.trim());
            return Err(SessionError::remote(command, &output.stderr));
        }
        if !output.stderr.trim().is_empty() {
            tracing::debug!("Ignoring benign stderr from `{}`", command);
        }

        tracing::debug!("Command `{}` finished (exit status {:?})", command, output.exit_status);
        Ok(output.stdout)
    }

    async fn close_side(&mut self) {
        if let Some(link) = self.side.take() {
            tracing::debug!("Closing side {} connection", link.side);
            if let Err(e) = link.shell.close().await {
                tracing::warn!("Failed to close side {} connection: {}", link.side, e);
            }
        }
    }

    async fn teardown(&mut self) {
        self.close_side().await;
        if let VehicleLink::Jump(shell) = mem::replace(&mut self.vehicle, VehicleLink::Disconnected)
        {
            if let Err(e) = shell.close().await {
                tracing::warn!("Failed to close vehicle connection: {}", e);
            }
        }
    }
}

#[async_trait]
impl<C: Connector> CommandExecutor for SessionManager<C> {
    async fn execute(&self, command: &str) -> Result<String, SessionError> {
        self.execute_side_command(command).await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
