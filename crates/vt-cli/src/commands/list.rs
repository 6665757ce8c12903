//! List command implementation

use anyhow::{Context, Result};

use vt_core::config::VehicleBook;

use super::session::{load_settings, ConfigPaths};
use crate::output::{format_profiles, print_info, print_warning};

/// List vehicle profiles, creating the example file on first use
pub fn list_command(paths: &ConfigPaths, long: bool) -> Result<()> {
    let settings = load_settings(&paths.settings)?;
    let (book, created) =
        VehicleBook::load_or_create(&paths.vehicles, &settings.remote.default_working_directory)
            .with_context(|| format!("Failed to load vehicle profiles from {:?}", paths.vehicles))?;

    if created {
        print_warning(&format!(
            "No profile file found, created an example at {:?}",
            paths.vehicles
        ));
    }

    println!("{}", format_profiles(&book, long));
    if book.len() > 1 {
        print_info(&format!("{} vehicles", book.len()));
    }
    Ok(())
}
