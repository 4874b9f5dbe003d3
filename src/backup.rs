//! Sibling backup of a working directory taken before it is mutated.
//!
//! For `some/dir/project` the backup lives at `some/dir/backup_project`.
//! A [`Backup`] is either discarded after a successful update or restored
//! over the original directory after a failed one.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

const BACKUP_PREFIX: &str = "backup_";

/// Compute `<parent>/backup_<name>` for `path`.
///
/// A bare relative name such as `project` gets a bare `backup_project`.
///
/// # Errors
/// `InvalidPath` when `path` has no final component (`/`, `..`).
pub fn backup_path_for(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| SyncError::InvalidPath {
        path: path.to_path_buf(),
    })?;
    let mut backup_name = std::ffi::OsString::from(BACKUP_PREFIX);
    backup_name.push(name);
    Ok(match path.parent() {
        Some(parent) => parent.join(backup_name),
        None => PathBuf::from(backup_name),
    })
}

/// A backup copy that has been written to disk.
#[derive(Debug)]
pub struct Backup {
    original: PathBuf,
    path: PathBuf,
}

impl Backup {
    /// Copy `original` recursively into its sibling backup directory.
    ///
    /// # Errors
    /// - `BackupExists` if the backup directory is already present; it is
    ///   left untouched.
    /// - `BackupFailed` if copying fails; the partial copy is removed.
    pub fn create(original: &Path) -> Result<Self> {
        let path = backup_path_for(original)?;
        if fs::symlink_metadata(&path).is_ok() {
            return Err(SyncError::BackupExists { path });
        }

        debug!("backing up {} to {}", original.display(), path.display());
        if let Err(source) = copy_dir_all(original, &path) {
            let _ = fs::remove_dir_all(&path);
            return Err(SyncError::BackupFailed { path, source });
        }

        Ok(Self {
            original: original.to_path_buf(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backup after a successful update.
    pub fn discard(self) -> io::Result<()> {
        debug!("removing backup {}", self.path.display());
        fs::remove_dir_all(&self.path)
    }

    /// Put the backup back in place of the original directory.
    ///
    /// The original is removed and the backup renamed over it, so the
    /// backup directory no longer exists afterwards.
    ///
    /// # Errors
    /// `RestoreFailed`; the backup directory is left on disk for manual
    /// recovery.
    pub fn restore(self) -> Result<()> {
        let restore_failed = |source| SyncError::RestoreFailed {
            path: self.original.clone(),
            backup: self.path.clone(),
            source,
        };

        warn!(
            "restoring {} from {}",
            self.original.display(),
            self.path.display()
        );
        match fs::remove_dir_all(&self.original) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(restore_failed(e)),
        }
        fs::rename(&self.path, &self.original).map_err(restore_failed)
    }
}

/// Recursively copy `src` into `dst`, which must not exist yet.
///
/// Symbolic links are recreated as links, not followed.
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir(dst)?;
    for ent in fs::read_dir(src)? {
        let ent = ent?;
        let ft = ent.file_type()?;
        let to = dst.join(ent.file_name());
        if ft.is_dir() {
            copy_dir_all(&ent.path(), &to)?;
        } else if ft.is_symlink() {
            copy_symlink(&ent.path(), &to)?;
        } else {
            fs::copy(ent.path(), &to)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
