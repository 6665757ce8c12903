//! Shell command and diagnostics commands

use anyhow::{Context, Result};

use super::session::{open_session, ConfigPaths, TargetArgs};
use crate::output::format_diagnostics;

/// Run a shell command on the side, or on the jump host with `on_vehicle`
pub async fn exec_command(
    target: &TargetArgs,
    paths: &ConfigPaths,
    command: &[String],
    on_vehicle: bool,
) -> Result<()> {
    let command = command.join(" ");
    let mut session = open_session(target, paths).await?;

    let result = if on_vehicle {
        session.execute_vehicle_command(&command).await
    } else {
        session.execute_side_command(&command).await
    };
    session.disconnect().await;

    let output = result.with_context(|| format!("`{}` failed", command))?;
    print!("{}", output);
    Ok(())
}

/// Connect and print the session report with probe output
pub async fn diagnose_command(target: &TargetArgs, paths: &ConfigPaths) -> Result<()> {
    let mut session = open_session(target, paths).await?;
    let report = session.diagnose().await;
    session.disconnect().await;

    print!("{}", format_diagnostics(&report));
    Ok(())
}
