//! Opening a session from a vehicle profile

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;

use vt_core::config::{self, Settings, VehicleBook, VehicleProfile, HEADUNIT_LOCAL};
use vt_core::types::Side;
use vt_session::{SessionManager, SshConnector};

use crate::output::{describe_profile, print_info, print_success, print_warning};
use crate::prompt::TerminalPrompt;

/// Resolved locations of the two configuration files
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub settings: PathBuf,
    pub vehicles: PathBuf,
}

impl ConfigPaths {
    pub fn resolve(settings: Option<PathBuf>, vehicles: Option<PathBuf>) -> Self {
        Self {
            settings: settings.unwrap_or_else(config::default_config_path),
            vehicles: vehicles.unwrap_or_else(config::default_vehicles_path),
        }
    }
}

/// Which vehicle and side to connect to
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Vehicle profile name from vehicles.json
    #[arg(short, long)]
    pub car: Option<String>,

    /// Use the built-in head-unit profile (direct, 192.168.1.6 / 192.168.1.70)
    #[arg(long, conflicts_with = "car")]
    pub headunit: bool,

    /// Side to open (A or B); defaults to the profile's preferred side
    #[arg(short, long)]
    pub side: Option<Side>,

    /// Connect to the sides directly even if the profile uses a jump host
    #[arg(long)]
    pub force_direct: bool,

    /// Side username (overrides profile and settings)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Side password for direct connections
    #[arg(long, env = "VT_SIDE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Remote working directory holding params.json
    #[arg(short, long)]
    pub workdir: Option<String>,
}

/// Load `config.toml`, using defaults when the file does not exist
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }
    config::load_config(path).with_context(|| format!("Failed to load settings from {:?}", path))
}

/// Pick the profile named by `target`
pub fn resolve_profile(
    target: &TargetArgs,
    paths: &ConfigPaths,
    settings: &Settings,
) -> Result<(String, VehicleProfile)> {
    let working_directory = &settings.remote.default_working_directory;

    if target.headunit || target.car.as_deref() == Some(HEADUNIT_LOCAL) {
        let book = VehicleBook::headunit_local(working_directory);
        return Ok((HEADUNIT_LOCAL.to_string(), book.get(HEADUNIT_LOCAL)?.clone()));
    }

    let name = target
        .car
        .as_deref()
        .context("No vehicle selected, pass --car <NAME> or --headunit")?;

    let (book, created) = VehicleBook::load_or_create(&paths.vehicles, working_directory)
        .with_context(|| format!("Failed to load vehicle profiles from {:?}", paths.vehicles))?;
    if created {
        print_warning(&format!(
            "Created example vehicle profiles at {:?}",
            paths.vehicles
        ));
    }

    let profile = book.get(name)?.clone();
    Ok((name.to_string(), profile))
}

/// Connect to the vehicle and side selected by `target`
pub async fn open_session(
    target: &TargetArgs,
    paths: &ConfigPaths,
) -> Result<SessionManager<SshConnector>> {
    let settings = load_settings(&paths.settings)?;
    let (name, profile) = resolve_profile(target, paths, &settings)?;

    let side = target.side.unwrap_or(profile.preferred_side);
    let ip = profile.side_ip(side).to_string();
    let username = target
        .user
        .clone()
        .or_else(|| profile.side_username(side).map(str::to_string));
    let working_directory = target
        .workdir
        .clone()
        .or_else(|| profile.working_directory.clone());

    print_info(&format!("Connecting to {}", describe_profile(&name, &profile)));

    let connector = SshConnector::from_settings(&settings.ssh);
    let mut session = SessionManager::new(connector, settings, TerminalPrompt);

    if profile.is_direct() || target.force_direct {
        let password = target
            .password
            .clone()
            .or_else(|| profile.side_password(side).map(str::to_string));
        let message = session
            .connect_headunit_direct(
                &name,
                side,
                &ip,
                username.as_deref(),
                password.as_deref(),
                profile.port,
                working_directory.as_deref(),
            )
            .await
            .map_err(|e| {
                suggest_other_side(side);
                e
            })?;
        print_success(&message);
        return Ok(session);
    }

    let login = profile
        .ssh_command
        .as_deref()
        .ok_or_else(|| anyhow!("Vehicle '{}' uses a jump host but has no ssh_command", name))?;

    let message = session
        .connect_to_vehicle(&name, login, profile.port, working_directory.as_deref())
        .await?;
    print_success(&message);

    match session
        .connect_to_side_tunnel(side, &ip, username.as_deref(), profile.port)
        .await
    {
        Ok(message) => {
            print_success(&message);
            Ok(session)
        }
        Err(e) => {
            session.disconnect().await;
            suggest_other_side(side);
            Err(e.into())
        }
    }
}

fn suggest_other_side(side: Side) {
    print_info(&format!(
        "If side {} is unavailable, try --side {}",
        side,
        side.other()
    ));
}
