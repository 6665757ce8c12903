//! Remote JSON file commands

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use vt_core::types::RemoteFileKind;
use vt_session::{validate_json, SessionManager, SizeCheck, SshConnector};

use super::config::launch_editor;
use super::session::{open_session, ConfigPaths, TargetArgs};
use crate::output::{
    format_file_status, format_write_report, print_info, print_success, print_warning,
};

const ALL_FILES: [RemoteFileKind; 2] = [RemoteFileKind::Params, RemoteFileKind::Adas];

/// Report where both files resolve on the selected side
pub async fn check_command(target: &TargetArgs, paths: &ConfigPaths) -> Result<()> {
    let mut session = open_session(target, paths).await?;

    let result = async {
        for kind in ALL_FILES {
            let status = session.check_file(kind).await?;
            println!("{}", format_file_status(&status));
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    session.disconnect().await;
    result
}

/// Remount the side's filesystem read-write
pub async fn mount_command(target: &TargetArgs, paths: &ConfigPaths) -> Result<()> {
    let mut session = open_session(target, paths).await?;
    let result = session.mount_filesystem().await;
    session.disconnect().await;

    result.context("Remount failed")?;
    print_success("Filesystem remounted read-write");
    Ok(())
}

/// Print a remote file, or save it to `output`
pub async fn read_command(
    target: &TargetArgs,
    paths: &ConfigPaths,
    kind: RemoteFileKind,
    output: Option<&Path>,
) -> Result<()> {
    let mut session = open_session(target, paths).await?;
    let result = session.read_file(kind).await;
    session.disconnect().await;

    let content = result.with_context(|| format!("Failed to read {} file", kind))?;
    if validate_json(&content).is_err() {
        print_warning("Remote content is not valid JSON");
    }

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {:?}", path))?;
            print_success(&format!("Saved {} file to {:?}", kind, path));
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Upload a local JSON file; `-` reads stdin
pub async fn write_command(
    target: &TargetArgs,
    paths: &ConfigPaths,
    kind: RemoteFileKind,
    input: &Path,
) -> Result<()> {
    let content = read_input(input)?;
    validate_json(&content).with_context(|| format!("{:?} is not valid JSON", input))?;

    let mut session = open_session(target, paths).await?;
    let result = session.write_file(kind, &content).await;
    session.disconnect().await;

    let report = result.with_context(|| format!("Failed to write {} file", kind))?;
    report_write(&report.size_check, &format_write_report(&report));
    Ok(())
}

/// Download a file, open it in `$EDITOR`, and upload it if it changed
pub async fn edit_command(
    target: &TargetArgs,
    paths: &ConfigPaths,
    kind: RemoteFileKind,
) -> Result<()> {
    let mut session = open_session(target, paths).await?;
    let result = edit_remote(&session, kind).await;
    session.disconnect().await;
    result
}

async fn edit_remote(session: &SessionManager<SshConnector>, kind: RemoteFileKind) -> Result<()> {
    let original = session
        .read_file(kind)
        .await
        .with_context(|| format!("Failed to read {} file", kind))?;

    let scratch = tempfile::Builder::new()
        .prefix(kind.temp_stem())
        .suffix(".json")
        .tempfile()
        .context("Failed to create scratch file")?;
    std::fs::write(scratch.path(), &original).context("Failed to write scratch file")?;

    launch_editor(scratch.path())?;

    let edited = std::fs::read_to_string(scratch.path()).context("Failed to read scratch file")?;
    if edited.trim() == original.trim() {
        print_info("No changes");
        return Ok(());
    }
    if let Err(e) = validate_json(&edited) {
        bail!("Edited content is not valid JSON, nothing uploaded: {}", e);
    }

    let report = session
        .write_file(kind, &edited)
        .await
        .with_context(|| format!("Failed to write {} file", kind))?;
    report_write(&report.size_check, &format_write_report(&report));
    Ok(())
}

fn report_write(size_check: &SizeCheck, message: &str) {
    match size_check {
        SizeCheck::Match => print_success(message),
        _ => print_warning(message),
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))
}
