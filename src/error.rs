use std::path::PathBuf;
use thiserror::Error;

/// Every way a single repository sync can fail.
///
/// Variants are deliberately coarse: they name the step that failed and
/// carry the underlying `git2` / `io` error as their source.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot open repository at `{}`: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        source: git2::Error,
    },
    #[error("git clone {url} failed: {source}")]
    CloneFailed { url: String, source: git2::Error },
    #[error("cannot resolve local path `{}`: {source}", path.display())]
    ResolvePath {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("local path `{}` has no usable directory name", path.display())]
    InvalidPath { path: PathBuf },
    #[error("remote branch {remote}/{branch} does not exist")]
    RemoteBranchMissing { remote: String, branch: String },
    #[error("git fetch {remote} failed: {source}")]
    FetchFailed { remote: String, source: git2::Error },
    #[error("backup directory `{}` already exists", path.display())]
    BackupExists { path: PathBuf },
    #[error("failed to back up into `{}`: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("branch `{branch}` cannot be fast-forwarded to {remote}/{branch}")]
    NotFastForward { remote: String, branch: String },
    #[error("checking out `{branch}` would overwrite local changes: {source}")]
    CheckoutConflict {
        branch: String,
        source: git2::Error,
    },
    #[error("merging into `{branch}` conflicts in: {}", paths.join(", "))]
    MergeConflict { branch: String, paths: Vec<String> },
    #[error("failed to restore `{}` from backup `{}`: {source}", path.display(), backup.display())]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        source: std::io::Error,
    },
    #[error("Libgit2Error: {0}")]
    Git(#[from] git2::Error),
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
