//! Timestamped file backups.
//!
//! Before a tracked content file is overwritten, the existing version is
//! renamed aside with a sortable timestamp so edits are never destructive:
//! `contact.html` -> `contact_bk20260829153012.html`. Backups are never
//! deleted automatically.
//!
//! Known limitation: two backups of the same file within the same second
//! collide on the same name and the second rename wins.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Marker inserted between the file stem and the timestamp.
const BACKUP_MARKER: &str = "_bk";

/// Rename `file` to a timestamped backup, returning the backup path.
///
/// The timestamp is the file's last-modified time, zero-padded at second
/// resolution so backup names sort chronologically. A missing file is a
/// no-op returning `Ok(None)`.
pub fn save_backup(file: &Path) -> Result<Option<PathBuf>> {
    let meta = match fs::metadata(file) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to stat {}", file.display()));
        }
    };

    let modified = meta
        .modified()
        .with_context(|| format!("No mtime for {}", file.display()))?;
    let timestamp = DateTime::<Utc>::from(modified).format("%Y%m%d%H%M%S");

    let backup = backup_path(file, &timestamp.to_string());
    fs::rename(file, &backup).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            file.display(),
            backup.display()
        )
    })?;

    Ok(Some(backup))
}

/// Whether a file name is one of our backups (used to skip them in scans).
pub fn is_backup_name(name: &str) -> bool {
    name.contains(BACKUP_MARKER)
}

/// Insert `_bk<timestamp>` before the extension.
fn backup_path(file: &Path, timestamp: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match file.extension() {
        Some(ext) => format!("{stem}{BACKUP_MARKER}{timestamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}{BACKUP_MARKER}{timestamp}"),
    };
    file.with_file_name(name)
}
