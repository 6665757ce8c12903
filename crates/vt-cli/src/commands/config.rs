//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use vt_core::config::{self, Settings, VehicleBook};

use super::session::ConfigPaths;
use crate::output::{print_error, print_info, print_success, print_warning};

/// Print both configuration files
pub fn config_show(paths: &ConfigPaths) -> Result<()> {
    for path in [&paths.settings, &paths.vehicles] {
        if !path.exists() {
            print_warning(&format!("No file at {:?}", path));
            continue;
        }

        print_info(&format!("{:?}", path));
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        println!("{}", content.trim_end());
        println!();
    }

    if !paths.settings.exists() {
        print_info("Run 'vehicle-term config init' to create the settings file");
    }
    Ok(())
}

/// Print the configuration file locations
pub fn config_path(paths: &ConfigPaths) {
    println!("settings: {}", paths.settings.display());
    println!("vehicles: {}", paths.vehicles.display());
}

/// Write default settings and, if missing, the example vehicle profiles
pub fn config_init(paths: &ConfigPaths, force: bool) -> Result<()> {
    if paths.settings.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", paths.settings));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    let settings = Settings::default();
    config::save_config(&paths.settings, &settings)
        .with_context(|| format!("Failed to write config file: {:?}", paths.settings))?;
    print_success(&format!("Created configuration file: {:?}", paths.settings));

    if !paths.vehicles.exists() {
        VehicleBook::with_default_profile(&settings.remote.default_working_directory)
            .save(&paths.vehicles)
            .with_context(|| format!("Failed to write {:?}", paths.vehicles))?;
        print_success(&format!("Created vehicle profiles: {:?}", paths.vehicles));
    }

    Ok(())
}

/// Open the settings file in `$EDITOR`
pub fn config_edit(paths: &ConfigPaths) -> Result<()> {
    if !paths.settings.exists() {
        print_error(&format!("Config file not found: {:?}", paths.settings));
        print_info("Run 'vehicle-term config init' to create one");
        return Ok(());
    }
    launch_editor(&paths.settings)
}

/// Open `path` in `$EDITOR` (or `$VISUAL`) and wait for it to exit
pub(crate) fn launch_editor(path: &Path) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        });

    tracing::debug!("Opening {:?} with {}", path, editor);
    let status = std::process::Command::new(&editor)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to open editor: {}", editor))?;

    if !status.success() {
        anyhow::bail!("Editor {} exited with {}", editor, status);
    }
    Ok(())
}
