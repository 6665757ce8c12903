//! Vehicle profiles (`vehicles.json`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::write_creating_parent;
use crate::error::ConfigError;
use crate::types::{ConnectionType, Side};

/// Name of the built-in profile used when running on the vehicle network
pub const HEADUNIT_LOCAL: &str = "CAR_HEADUNIT_LOCAL";

const DEFAULT_A_SIDE: &str = "192.168.1.6";
const DEFAULT_B_SIDE: &str = "192.168.1.70";

fn default_a_side() -> String {
    DEFAULT_A_SIDE.to_string()
}

fn default_b_side() -> String {
    DEFAULT_B_SIDE.to_string()
}

fn default_port() -> u16 {
    22
}

/// Connection details for one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleProfile {
    /// Direct to the sides, or through a jump host
    #[serde(default)]
    pub connection_type: ConnectionType,

    /// Address of side A
    #[serde(default = "default_a_side")]
    pub a_side: String,

    /// Address of side B
    #[serde(default = "default_b_side")]
    pub b_side: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_side_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_side_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_side_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_side_password: Option<String>,

    /// Directory holding `params.json` (falls back to the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// SSH port for the jump host and the sides
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login string for the jump host, e.g. `user@jump@10.0.0.5`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_command: Option<String>,

    /// Side opened first by a direct connection
    #[serde(default)]
    pub preferred_side: Side,
}

impl VehicleProfile {
    /// A direct profile with the standard head-unit side addresses
    pub fn direct(working_directory: impl Into<String>) -> Self {
        Self {
            connection_type: ConnectionType::Direct,
            a_side: default_a_side(),
            b_side: default_b_side(),
            a_side_username: Some("root".to_string()),
            b_side_username: Some("root".to_string()),
            a_side_password: None,
            b_side_password: None,
            working_directory: Some(working_directory.into()),
            port: default_port(),
            ssh_command: None,
            preferred_side: Side::A,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.connection_type == ConnectionType::Direct
    }

    pub fn side_ip(&self, side: Side) -> &str {
        match side {
            Side::A => &self.a_side,
            Side::B => &self.b_side,
        }
    }

    pub fn side_username(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.a_side_username.as_deref(),
            Side::B => self.b_side_username.as_deref(),
        }
    }

    pub fn side_password(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.a_side_password.as_deref(),
            Side::B => self.b_side_password.as_deref(),
        }
    }
}

/// All known vehicle profiles, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleBook {
    profiles: BTreeMap<String, VehicleProfile>,
}

impl VehicleBook {
    /// Book containing the single generated example profile
    pub fn with_default_profile(working_directory: &str) -> Self {
        let mut book = Self::default();
        book.insert("example-direct", VehicleProfile::direct(working_directory));
        book
    }

    /// Book containing only the built-in head-unit profile
    pub fn headunit_local(working_directory: &str) -> Self {
        let mut book = Self::default();
        book.insert(HEADUNIT_LOCAL, VehicleProfile::direct(working_directory));
        book
    }

    /// Load profiles from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("Failed to read profiles: {}", e)))?;
        let book: Self = serde_json::from_str(&content)?;

        tracing::info!("Loaded {} vehicle profile(s) from {:?}", book.len(), path);
        Ok(book)
    }

    /// Load profiles, writing a default file first if none exists
    ///
    /// Returns the book and whether the file was created.
    pub fn load_or_create(
        path: &Path,
        default_working_directory: &str,
    ) -> Result<(Self, bool), ConfigError> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }

        tracing::warn!("Profile file {:?} not found, creating default", path);
        let book = Self::with_default_profile(default_working_directory);
        book.save(path)?;
        Ok((book, true))
    }

    /// Write profiles as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        write_creating_parent(path, &content)
    }

    pub fn insert(&mut self, name: impl Into<String>, profile: VehicleProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Look up a profile by exact name
    pub fn get(&self, name: &str) -> Result<&VehicleProfile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownVehicle(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VehicleProfile)> {
        self.profiles.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
