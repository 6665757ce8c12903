//! Configuration management for vehicle-term
//!
//! Tool settings live in `config.toml`; vehicle profiles live in
//! `vehicles.json`. Both default to the platform config directory.

mod settings;
mod vehicles;

pub use settings::{
    MountSettings, RemotePaths, Settings, SideDefaults, SshSettings, StderrPolicy,
};
pub use vehicles::{VehicleBook, VehicleProfile, HEADUNIT_LOCAL};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vehicle-term")
}

/// Get the default settings file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Get the default vehicle profile file path
pub fn default_vehicles_path() -> PathBuf {
    default_config_dir().join("vehicles.json")
}

/// Load a TOML configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save a TOML configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    write_creating_parent(path, &content)
}

pub(crate) fn write_creating_parent(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Invalid(format!("Failed to create config dir: {}", e))
            })?;
        }
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}
