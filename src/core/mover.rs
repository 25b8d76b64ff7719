//! Moves a detected file into the profile's destination folder
//!
//! The mover does the filesystem work and reports an outcome. Recording
//! that outcome (statistics, events, notifications) is up to the session.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use super::profile::{lowercase_extension, Profile};
use crate::error::MonitorError;

/// `EXDEV` on both Linux and macOS.
#[cfg(unix)]
const CROSS_DEVICE_ERROR: i32 = 18;

#[derive(Debug)]
pub enum MoveOutcome {
    /// Filtered out by the profile's extension set. Not recorded anywhere.
    Ignored,
    Moved {
        source: PathBuf,
        destination: PathBuf,
        extension: String,
    },
    Failed {
        source: PathBuf,
        error: MonitorError,
    },
}

#[derive(Debug, Clone)]
pub struct Mover {
    resolve_conflicts: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Mover {
    /// With `resolve_conflicts` off, a name collision fails the move.
    pub fn new(resolve_conflicts: bool) -> Self {
        Self { resolve_conflicts }
    }

    pub fn handle(&self, path: &Path, profile: &Profile) -> MoveOutcome {
        if !profile.matches_extension(path) {
            tracing::debug!("Skipping {} (extension filtered)", path.display());
            return MoveOutcome::Ignored;
        }

        match self.move_into(path, &profile.destination_folder) {
            Ok(destination) => {
                tracing::info!(src = %path.display(), dest = %destination.display(), "Moved file");
                MoveOutcome::Moved {
                    source: path.to_path_buf(),
                    destination,
                    extension: lowercase_extension(path),
                }
            }
            Err(error) => {
                tracing::error!("Failed to move {}: {}", path.display(), error);
                MoveOutcome::Failed {
                    source: path.to_path_buf(),
                    error,
                }
            }
        }
    }

    fn move_into(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, MonitorError> {
        let file_name = source.file_name().ok_or_else(|| {
            MonitorError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("source has no file name: {}", source.display()),
            ))
        })?;

        let preferred = destination_dir.join(file_name);
        let mut target = preferred.clone();
        loop {
            match move_file(source, &target) {
                Ok(()) => return Ok(target),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if !self.resolve_conflicts {
                        return Err(MonitorError::DestinationExists(target));
                    }
                    // Another writer may take the candidate first; try again.
                    target = resolve_conflict(&preferred);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// First free `name (N).ext` next to `target`, starting at 1.
/// Returns `target` unchanged when nothing occupies it.
pub fn resolve_conflict(target: &Path) -> PathBuf {
    if !entry_exists(target) {
        return target.to_path_buf();
    }

    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = parent.join(format!("{} ({}){}", stem, counter, suffix));
        if !entry_exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// Broken symlinks still occupy the name.
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Move `source` to `target` without ever replacing an existing entry.
/// Fails with `AlreadyExists` when `target` is taken.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::hard_link(source, target) {
        Ok(()) => remove_source(source, target),
        Err(err) if is_final(&err) => Err(err),
        Err(err) => {
            if is_cross_device(&err) {
                tracing::debug!("Cross-device move of {}, copying", source.display());
            } else {
                tracing::debug!("Cannot link {} ({}), copying", source.display(), err);
            }
            copy_new(source, target)?;
            remove_source(source, target)
        }
    }
}

// Errors that a copy would hit just the same.
fn is_final(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::AlreadyExists | io::ErrorKind::NotFound)
}

fn copy_new(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(source)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(target)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.sync_all())
        .and_then(|_| fs::set_permissions(target, reader.metadata()?.permissions()));
    if let Err(err) = copied {
        let _ = fs::remove_file(target);
        return Err(err);
    }
    Ok(())
}

fn remove_source(source: &Path, target: &Path) -> io::Result<()> {
    if let Err(err) = fs::remove_file(source) {
        let _ = fs::remove_file(target);
        return Err(err);
    }
    Ok(())
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE_ERROR)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}
