//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two redundant compute sides of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    A,
    B,
}

impl Side {
    /// The other side
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => Err(format!("unknown side '{}', expected A or B", other)),
        }
    }
}

/// How a vehicle is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// SSH straight to the side addresses (on the vehicle network)
    Direct,
    /// SSH to a jump host, then forward to the side addresses
    #[default]
    Tunnel,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Direct => write!(f, "direct"),
            ConnectionType::Tunnel => write!(f, "tunnel"),
        }
    }
}

/// Network address of an SSH server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Username and optional password for password authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Captured result of a remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<u32>,
}

/// What the password prompt is asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Human readable target, e.g. `vehicle` or `side A`
    pub target: String,
    pub username: String,
    pub host: String,
}

impl fmt::Display for PromptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}@{})", self.target, self.username, self.host)
    }
}

/// The two logical JSON files that can be edited on a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteFileKind {
    /// `params.json` under the session working directory
    Params,
    /// `adas_params.json` under the fixed ADAS directory
    Adas,
}

impl RemoteFileKind {
    /// Stem used for temporary upload files
    pub fn temp_stem(self) -> &'static str {
        match self {
            RemoteFileKind::Params => "params",
            RemoteFileKind::Adas => "adas_params",
        }
    }
}

impl fmt::Display for RemoteFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFileKind::Params => write!(f, "params"),
            RemoteFileKind::Adas => write!(f, "adas"),
        }
    }
}

impl FromStr for RemoteFileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "params" | "params.json" => Ok(RemoteFileKind::Params),
            "adas" | "adas_params" | "adas_params.json" => Ok(RemoteFileKind::Adas),
            other => Err(format!("unknown file '{}', expected params or adas", other)),
        }
    }
}
