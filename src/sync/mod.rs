mod jobs;
mod progress;

use anyhow::{Context, bail};
use git2::{Oid, Repository};
use log::{error, info, warn};
use std::fmt;
use std::path::Path;

use crate::backup::Backup;
use crate::config::load_config;
use crate::error::{Result, SyncError};
use crate::paths::absolutize;
use crate::git::{
    Acquired, ORIGIN, Relation, ensure_local_branch, fast_forward, fetch_origin, merge_into,
    open_or_clone, relation, remote_branch_tip,
};

use progress::{err_style, ok_style, spinner};

/// Knobs for a single [`sync`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Fetch `origin` right after opening an existing clone, so the
    /// up-to-date check sees the current remote state.
    pub prefetch: bool,
    /// Refuse to create merge commits; diverged histories fail with
    /// [`SyncError::NotFastForward`].
    pub ff_only: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            prefetch: true,
            ff_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    FastForward,
    MergeCommit,
}

/// What a successful [`sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local and remote branch tips were already the same commit.
    UpToDate { commit: Oid },
    /// The local branch already contains the remote tip.
    Ahead { local: Oid, remote: Oid },
    /// The local branch moved from `from` to `to`.
    Updated { from: Oid, to: Oid, merge: MergeKind },
}

impl SyncOutcome {
    /// `true` only when the local branch actually changed.
    pub fn is_updated(&self) -> bool {
        matches!(self, SyncOutcome::Updated { .. })
    }
}

fn short(oid: &Oid) -> String {
    let s = oid.to_string();
    s[..7.min(s.len())].to_string()
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::UpToDate { commit } => {
                write!(f, "already up to date ({})", short(commit))
            }
            SyncOutcome::Ahead { local, remote } => {
                write!(f, "ahead of remote ({} contains {})", short(local), short(remote))
            }
            SyncOutcome::Updated {
                from,
                to,
                merge: MergeKind::FastForward,
            } => write!(f, "fast-forwarded {}..{}", short(from), short(to)),
            SyncOutcome::Updated {
                from,
                to,
                merge: MergeKind::MergeCommit,
            } => write!(f, "merged {} into {}", short(from), short(to)),
        }
    }
}

/// Bring branch `branch` of the repository at `path` up to date with
/// `origin/<branch>` of `url`.
///
/// High-level flow:
/// 1. Resolve `path` to an absolute path with `.` and `..` folded away,
///    so the backup always has a real name and parent. Open it, or clone
///    `url` into it when there is no `.git` yet. An opened clone is
///    fetched first when `opts.prefetch` is set.
/// 2. Resolve `origin/<branch>` and the local `<branch>`, creating the
///    local branch at the remote tip when missing.
/// 3. Equal tips, or a local branch already containing the remote tip,
///    return without touching anything.
/// 4. Otherwise back up `path` to `backup_<name>` beside it, fetch, then
///    fast-forward or merge.
/// 5. On success the backup is deleted. On any failure after the backup
///    was taken, `path` is restored from it before the error is returned,
///    so callers see either the updated tree or the original one.
///
/// # Errors
/// See [`SyncError`]. `RestoreFailed` means the backup could not be put
/// back and was left on disk.
pub fn sync(url: &str, path: &Path, branch: &str, opts: &SyncOptions) -> Result<SyncOutcome> {
    let path = &absolutize(path).map_err(|source| SyncError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })?;
    let (repo, acquired) = open_or_clone(url, path)?;
    if acquired == Acquired::Opened && opts.prefetch {
        fetch_origin(&repo)?;
    }

    let remote_tip = remote_branch_tip(&repo, branch)?;
    let local_tip = ensure_local_branch(&repo, branch, remote_tip)?;

    match relation(&repo, local_tip, remote_tip)? {
        Relation::Same => {
            info!("{}: {} already up to date", path.display(), branch);
            return Ok(SyncOutcome::UpToDate { commit: local_tip });
        }
        Relation::Ahead => {
            info!("{}: {} is ahead of {}/{}", path.display(), branch, ORIGIN, branch);
            return Ok(SyncOutcome::Ahead {
                local: local_tip,
                remote: remote_tip,
            });
        }
        Relation::Behind | Relation::Diverged => {}
    }

    let backup = Backup::create(path)?;
    let res = update(&repo, branch, local_tip, opts);
    drop(repo);

    match res {
        Ok(outcome) => {
            info!("{}: updated {} from {}: {}", path.display(), branch, url, outcome);
            if let Err(e) = backup.discard() {
                warn!("could not remove backup of {}: {}", path.display(), e);
            }
            Ok(outcome)
        }
        Err(e) => {
            error!("{}: update failed: {}", path.display(), e);
            backup.restore()?;
            Err(e)
        }
    }
}

/// The mutating half of [`sync`]; only runs with a backup in place.
fn update(
    repo: &Repository,
    branch: &str,
    local_tip: Oid,
    opts: &SyncOptions,
) -> Result<SyncOutcome> {
    fetch_origin(repo)?;
    let remote_tip = remote_branch_tip(repo, branch)?;

    match relation(repo, local_tip, remote_tip)? {
        Relation::Same => Ok(SyncOutcome::UpToDate { commit: local_tip }),
        Relation::Ahead => Ok(SyncOutcome::Ahead {
            local: local_tip,
            remote: remote_tip,
        }),
        Relation::Behind => {
            fast_forward(repo, branch, remote_tip)?;
            Ok(SyncOutcome::Updated {
                from: local_tip,
                to: remote_tip,
                merge: MergeKind::FastForward,
            })
        }
        Relation::Diverged if opts.ff_only => Err(SyncError::NotFastForward {
            remote: ORIGIN.to_string(),
            branch: branch.to_string(),
        }),
        Relation::Diverged => {
            let merged = merge_into(repo, branch, local_tip, remote_tip)?;
            Ok(SyncOutcome::Updated {
                from: local_tip,
                to: merged,
                merge: MergeKind::MergeCommit,
            })
        }
    }
}

/// CLI command: sync one repository and report the result on a spinner line.
///
/// # Errors
/// Any [`SyncError`], with the local path attached as context.
pub fn cmd_sync(url: &str, path: &Path, branch: &str, opts: &SyncOptions) -> anyhow::Result<()> {
    let pb = spinner(format!("syncing {} ({}) from {}", path.display(), branch, url));

    match sync(url, path, branch, opts) {
        Ok(outcome) => {
            pb.set_style(ok_style());
            pb.finish_with_message(format!("{}: {}", path.display(), outcome));
            Ok(())
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("syncing {} failed", path.display()));
            Err(e).with_context(|| format!("sync {}", path.display()))
        }
    }
}

/// CLI command: sync every repository listed in the configuration file.
///
/// Repositories are processed one after another. A failure is shown on the
/// repository's own line and the remaining repositories still run.
///
/// # Errors
/// - The configuration cannot be loaded.
/// - One or more repositories failed to sync.
pub fn cmd_all(config: &Path) -> anyhow::Result<()> {
    let cfg = load_config(config)?;
    let jobs = jobs::build_jobs(&cfg);
    if jobs.is_empty() {
        eprintln!("no repositories in {}", config.display());
        return Ok(());
    }

    let opts = cfg.options();
    let mut failed = 0usize;
    for job in &jobs {
        let pb = spinner(format!("syncing {} ({})", job.display, job.branch));
        match sync(&job.url, &job.path, &job.branch, &opts) {
            Ok(outcome) => {
                pb.set_style(ok_style());
                pb.finish_with_message(format!("{}: {}", job.display, outcome));
            }
            Err(e) => {
                failed += 1;
                pb.set_style(err_style());
                pb.finish_with_message(format!("syncing {} (error: {})", job.display, e));
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} repositories failed to sync", failed, jobs.len());
    }
    Ok(())
}
