//! Remote JSON file transfer over plain shell commands
//!
//! Every operation is a sequence of commands sent through a
//! [`CommandExecutor`]; the first failing step fails the whole operation.
//! Paths are resolved again before every read, write or check:
//!
//! 1. `test -f` the primary path
//! 2. if absent, `test -f` the fallback path (primary with the configured
//!    directory segment replaced)
//! 3. use the fallback only when it exists and the primary does not
//!
//! Writes never pass file content through shell quoting. The content is
//! base64 encoded, decoded into a temporary file, then moved over the target.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use vt_core::config::{MountSettings, RemotePaths, Settings};
use vt_core::traits::CommandExecutor;
use vt_core::types::RemoteFileKind;
use vt_core::SessionError;

use crate::banner::strip_banner;

/// Check that `content` is a JSON document
pub fn validate_json(content: &str) -> Result<(), SessionError> {
    serde_json::from_str::<serde_json::Value>(content)
        .map(|_| ())
        .map_err(|e| SessionError::InvalidFormat(e.to_string()))
}

/// Where a logical file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLocation {
    Primary,
    Fallback,
    /// Neither path exists; the primary path will be created on write
    Missing,
}

/// Result of [`RemoteFiles::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub kind: RemoteFileKind,
    pub path: String,
    pub location: FileLocation,
}

impl FileStatus {
    pub fn exists(&self) -> bool {
        self.location != FileLocation::Missing
    }
}

/// Outcome of the post-write byte count comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    Match,
    Mismatch { remote: u64 },
    /// The byte count could not be read back
    Unavailable,
}

/// Result of a successful [`RemoteFiles::write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: String,
    /// UTF-8 length of the written content
    pub bytes: usize,
    pub size_check: SizeCheck,
}

/// JSON file operations on one remote side
pub struct RemoteFiles<'a, E: CommandExecutor + ?Sized> {
    exec: &'a E,
    paths: &'a RemotePaths,
    mount: &'a MountSettings,
    working_directory: &'a str,
}

impl<'a, E: CommandExecutor + ?Sized> RemoteFiles<'a, E> {
    pub fn new(exec: &'a E, settings: &'a Settings, working_directory: &'a str) -> Self {
        Self {
            exec,
            paths: &settings.remote,
            mount: &settings.mount,
            working_directory,
        }
    }

    /// Configured location of `kind`, before fallback
    pub fn primary_path(&self, kind: RemoteFileKind) -> String {
        match kind {
            RemoteFileKind::Params => join(self.working_directory, &self.paths.params_file),
            RemoteFileKind::Adas => {
                join(&self.paths.adas_working_directory, &self.paths.adas_params_file)
            }
        }
    }

    /// Alternate location of `kind`, if the primary path contains the
    /// fallback segment
    pub fn fallback_path(&self, kind: RemoteFileKind) -> Option<String> {
        let primary = self.primary_path(kind);
        let segment = self.paths.fallback_segment.as_str();
        if segment.is_empty() || !primary.contains(segment) {
            return None;
        }
        Some(primary.replace(segment, &self.paths.fallback_replacement))
    }

    /// Path to use for `kind` right now
    pub async fn resolve(&self, kind: RemoteFileKind) -> String {
        self.locate(kind).await.0
    }

    /// Resolve `kind` and report where it was found
    pub async fn check(&self, kind: RemoteFileKind) -> FileStatus {
        let (path, location) = self.locate(kind).await;
        FileStatus {
            kind,
            path,
            location,
        }
    }

    /// `test -f` on the remote side. Command errors count as absent.
    pub async fn file_exists(&self, path: &str) -> bool {
        let command = format!("test -f {} && echo OK || echo NO", quote(path));
        match self.exec.execute(&command).await {
            Ok(output) => output.lines().any(|line| line.trim() == "OK"),
            Err(e) => {
                tracing::debug!("Existence check for {} failed: {}", path, e);
                false
            }
        }
    }

    /// Remount the target filesystem read-write
    pub async fn mount(&self) -> Result<(), SessionError> {
        tracing::debug!("Remounting: {}", self.mount.command);
        self.exec.execute(&self.mount.command).await.map(|_| ())
    }

    /// Download `kind` with login banners removed
    pub async fn read(&self, kind: RemoteFileKind) -> Result<String, SessionError> {
        if let Err(e) = self.mount().await {
            tracing::warn!("Remount before read failed, continuing: {}", e);
        }

        let path = self.resolve(kind).await;
        tracing::info!("Reading {}", path);

        let raw = self.exec.execute(&format!("cat {}", quote(&path))).await?;
        Ok(strip_banner(&raw))
    }

    /// Upload `content` as `kind`
    ///
    /// Content that is not JSON is rejected before anything is sent. The
    /// byte count check afterwards is advisory and only reported.
    pub async fn write(
        &self,
        kind: RemoteFileKind,
        content: &str,
    ) -> Result<WriteReport, SessionError> {
        validate_json(content)?;
        self.mount().await?;

        let path = self.resolve(kind).await;
        let temp = self.temp_path(kind);
        tracing::info!("Writing {} bytes to {} via {}", content.len(), path, temp);

        let command = format!(
            "echo '{}' | base64 -d > {tmp} && chmod 644 {tmp} && mv {tmp} {} && sync",
            STANDARD.encode(content.as_bytes()),
            quote(&path),
            tmp = quote(&temp),
        );
        self.exec.execute(&command).await?;

        let size_check = self.verify_size(&path, content.len()).await;
        Ok(WriteReport {
            path,
            bytes: content.len(),
            size_check,
        })
    }

    async fn locate(&self, kind: RemoteFileKind) -> (String, FileLocation) {
        let primary = self.primary_path(kind);
        if self.file_exists(&primary).await {
            return (primary, FileLocation::Primary);
        }

        if let Some(fallback) = self.fallback_path(kind) {
            if self.file_exists(&fallback).await {
                tracing::info!("{} not found, using {}", primary, fallback);
                return (fallback, FileLocation::Fallback);
            }
        }

        tracing::debug!("{} not found at either location", kind);
        (primary, FileLocation::Missing)
    }

    async fn verify_size(&self, path: &str, expected: usize) -> SizeCheck {
        let output = match self
            .exec
            .execute(&format!("cat {} | wc -c", quote(path)))
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Could not verify size of {}: {}", path, e);
                return SizeCheck::Unavailable;
            }
        };

        match output.trim().parse::<u64>() {
            Ok(remote) if remote == expected as u64 => SizeCheck::Match,
            Ok(remote) => {
                tracing::warn!(
                    "Size mismatch for {}: wrote {} bytes, remote reports {}",
                    path,
                    expected,
                    remote
                );
                SizeCheck::Mismatch { remote }
            }
            Err(_) => {
                tracing::warn!("Unexpected byte count output for {}: {:?}", path, output);
                SizeCheck::Unavailable
            }
        }
    }

    fn temp_path(&self, kind: RemoteFileKind) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let name = format!(
            "{}_temp_{}_{:08x}.json",
            kind.temp_stem(),
            secs,
            rand::random::<u32>()
        );
        join(&self.paths.temp_dir, &name)
    }
}

fn join(dir: &str, file: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file)
}

/// Single-quote `value` for a POSIX shell
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
