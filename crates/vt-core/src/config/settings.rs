//! Tool settings (`config.toml`)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Side;

/// Top-level settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SSH defaults and timeouts
    pub ssh: SshSettings,
    /// Default credentials for the A/B sides
    pub sides: SideDefaults,
    /// Remote file locations
    pub remote: RemotePaths,
    /// Filesystem remount
    pub mount: MountSettings,
    /// Which stderr output is not treated as a failure
    pub stderr: StderrPolicy,
}

/// SSH connection defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// Username used when the login string names only a host
    pub default_username: String,

    /// Password tried first for jump-host connections
    pub default_password: String,

    /// Port used when a profile does not set one
    pub default_port: u16,

    /// TCP connect timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Password authentication timeout
    #[serde(with = "duration_secs")]
    pub auth_timeout: Duration,

    /// SSH banner / key exchange timeout
    #[serde(with = "duration_secs")]
    pub banner_timeout: Duration,

    /// Timeout for the `echo "connection_test"` liveness check
    #[serde(with = "duration_secs")]
    pub liveness_timeout: Duration,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            default_username: "ifly".to_string(),
            default_password: "auto".to_string(),
            default_port: 22,
            connect_timeout: Duration::from_secs(10),
            auth_timeout: Duration::from_secs(15),
            banner_timeout: Duration::from_secs(15),
            liveness_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-side default credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SideDefaults {
    pub a_side_username: String,
    pub b_side_username: String,
    pub a_side_password: Option<String>,
    pub b_side_password: Option<String>,
}

impl Default for SideDefaults {
    fn default() -> Self {
        Self {
            a_side_username: "root".to_string(),
            b_side_username: "root".to_string(),
            a_side_password: None,
            b_side_password: None,
        }
    }
}

impl SideDefaults {
    pub fn username(&self, side: Side) -> &str {
        match side {
            Side::A => &self.a_side_username,
            Side::B => &self.b_side_username,
        }
    }

    pub fn password(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.a_side_password.as_deref(),
            Side::B => self.b_side_password.as_deref(),
        }
    }
}

/// Where the editable files live on a side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemotePaths {
    /// Working directory used when a profile does not set one
    pub default_working_directory: String,

    /// Fixed directory of the ADAS parameters file
    pub adas_working_directory: String,

    /// File name of the primary parameters file
    pub params_file: String,

    /// File name of the ADAS parameters file
    pub adas_params_file: String,

    /// Directory segment replaced when probing the fallback location
    pub fallback_segment: String,

    /// Replacement for `fallback_segment`
    pub fallback_replacement: String,

    /// Remote directory for upload staging files
    pub temp_dir: String,
}

impl Default for RemotePaths {
    fn default() -> Self {
        let conf_dir = "/opt/usr/app/1/gea/runtime_service/planning_exec/res/conf".to_string();
        Self {
            default_working_directory: conf_dir.clone(),
            adas_working_directory: conf_dir,
            params_file: "params.json".to_string(),
            adas_params_file: "adas_params.json".to_string(),
            fallback_segment: "/planning_exec/".to_string(),
            fallback_replacement: "/control_exec/".to_string(),
            temp_dir: "/tmp".to_string(),
        }
    }
}

/// Remount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountSettings {
    /// Command that makes the target filesystem writable
    pub command: String,
}

impl Default for MountSettings {
    fn default() -> Self {
        Self {
            command: "mount -o remount,rw /opt/usr/app/1/gea".to_string(),
        }
    }
}

/// Stderr handling for remote commands
///
/// Any non-empty stderr fails the command unless it contains one of
/// `benign_patterns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StderrPolicy {
    pub benign_patterns: Vec<String>,
}

impl Default for StderrPolicy {
    fn default() -> Self {
        Self {
            benign_patterns: vec!["Permission denied".to_string()],
        }
    }
}

impl StderrPolicy {
    /// Whether `stderr` should fail the command
    pub fn is_failure(&self, stderr: &str) -> bool {
        if stderr.trim().is_empty() {
            return false;
        }
        !self
            .benign_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && stderr.contains(pattern.as_str()))
    }
}

// Durations are written as whole seconds
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
