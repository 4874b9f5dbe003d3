use git2::{
    BranchType, ErrorCode, FetchOptions, Index, Oid, Repository, Signature,
    build::{CheckoutBuilder, RepoBuilder},
};
use log::debug;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Name of the only remote `reposync` talks to.
pub const ORIGIN: &str = "origin";

/// How the repository handle for a sync was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    Opened,
    Cloned,
}

/// Position of a local branch tip relative to its remote-tracking tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Same,
    Ahead,
    Behind,
    Diverged,
}

/// Open the repository at `dest`, or clone `url` into it when `dest`
/// carries no `.git` metadata.
///
/// # Errors
/// `OpenFailed` / `CloneFailed` with the underlying libgit2 error.
pub fn open_or_clone(url: &str, dest: &Path) -> Result<(Repository, Acquired)> {
    if dest.join(".git").exists() {
        debug!("opening {}", dest.display());
        let repo = Repository::open(dest).map_err(|source| SyncError::OpenFailed {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok((repo, Acquired::Opened))
    } else {
        debug!("cloning {} into {}", url, dest.display());
        let mut builder = RepoBuilder::new();
        builder.fetch_options(FetchOptions::new());
        let repo = builder
            .clone(url, dest)
            .map_err(|source| SyncError::CloneFailed {
                url: url.to_string(),
                source,
            })?;
        Ok((repo, Acquired::Cloned))
    }
}

/// Perform `git fetch origin`, updating remote-tracking branches and tags.
///
/// # Errors
/// `FetchFailed` if the remote is missing or the transfer fails.
pub fn fetch_origin(repo: &Repository) -> Result<()> {
    let fetch_failed = |source| SyncError::FetchFailed {
        remote: ORIGIN.to_string(),
        source,
    };

    let mut fo = FetchOptions::new();
    let mut remote = repo.find_remote(ORIGIN).map_err(fetch_failed)?;
    remote
        .fetch(
            &[
                "refs/heads/*:refs/remotes/origin/*",
                "refs/tags/*:refs/tags/*",
            ],
            Some(&mut fo),
            None,
        )
        .map_err(fetch_failed)?;
    debug!("fetched {}", ORIGIN);
    Ok(())
}

/// Resolve the commit `refs/remotes/origin/<branch>` points at.
///
/// # Errors
/// `RemoteBranchMissing` if the remote-tracking ref does not exist.
pub fn remote_branch_tip(repo: &Repository, branch: &str) -> Result<Oid> {
    let name = format!("refs/remotes/{}/{}", ORIGIN, branch);
    let reference = match repo.find_reference(&name) {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
            return Err(SyncError::RemoteBranchMissing {
                remote: ORIGIN.to_string(),
                branch: branch.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(reference.peel_to_commit()?.id())
}

/// Resolve the tip of local branch `branch`, creating the branch at
/// `remote_tip` (tracking `origin/<branch>`) when it does not exist yet.
///
/// Creating the branch never touches the working tree.
pub fn ensure_local_branch(repo: &Repository, branch: &str, remote_tip: Oid) -> Result<Oid> {
    match repo.find_branch(branch, BranchType::Local) {
        Ok(b) => Ok(b.get().peel_to_commit()?.id()),
        Err(e) if e.code() == ErrorCode::NotFound => {
            let commit = repo.find_commit(remote_tip)?;
            let mut b = repo.branch(branch, &commit, false)?;
            b.set_upstream(Some(&format!("{}/{}", ORIGIN, branch)))?;
            debug!("created local branch {} at {}", branch, remote_tip);
            Ok(remote_tip)
        }
        Err(e) => Err(e.into()),
    }
}

/// Classify `local` against `remote` by ancestry.
pub fn relation(repo: &Repository, local: Oid, remote: Oid) -> Result<Relation> {
    if local == remote {
        Ok(Relation::Same)
    } else if repo.graph_descendant_of(local, remote)? {
        Ok(Relation::Ahead)
    } else if repo.graph_descendant_of(remote, local)? {
        Ok(Relation::Behind)
    } else {
        Ok(Relation::Diverged)
    }
}

fn head_is(repo: &Repository, refname: &str) -> bool {
    repo.head()
        .ok()
        .is_some_and(|h| h.name() == Some(refname))
}

/// Point local branch `branch` at `target`.
///
/// When HEAD is attached to the branch, the target tree is checked out
/// first in safe mode, so uncommitted changes are never overwritten and a
/// failed checkout leaves the branch where it was.
fn move_branch(repo: &Repository, branch: &str, target: Oid, log_msg: &str) -> Result<()> {
    let refname = format!("refs/heads/{}", branch);
    let mut reference = repo.find_reference(&refname)?;
    if head_is(repo, &refname) {
        let commit = repo.find_commit(target)?;
        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => SyncError::CheckoutConflict {
                    branch: branch.to_string(),
                    source: e,
                },
                _ => e.into(),
            })?;
    }
    reference.set_target(target, log_msg)?;
    Ok(())
}

/// Fast-forward `branch` to `target`.
pub fn fast_forward(repo: &Repository, branch: &str, target: Oid) -> Result<()> {
    let msg = format!("reposync: fast-forward {} to {}", branch, target);
    move_branch(repo, branch, target, &msg)?;
    debug!("fast-forwarded {} to {}", branch, target);
    Ok(())
}

/// Merge commit `theirs` into branch `branch` currently at `ours`,
/// recording a merge commit with parents `(ours, theirs)`.
///
/// # Errors
/// `MergeConflict` listing the conflicting paths; nothing is written in
/// that case.
pub fn merge_into(repo: &Repository, branch: &str, ours: Oid, theirs: Oid) -> Result<Oid> {
    let ours = repo.find_commit(ours)?;
    let theirs = repo.find_commit(theirs)?;

    let mut index = repo.merge_commits(&ours, &theirs, None)?;
    if index.has_conflicts() {
        return Err(SyncError::MergeConflict {
            branch: branch.to_string(),
            paths: conflict_paths(&index)?,
        });
    }

    let tree_id = index.write_tree_to(repo)?;
    let tree = repo.find_tree(tree_id)?;
    let sig = signature(repo)?;
    let msg = format!("Merge {}/{} into {}", ORIGIN, branch, branch);
    let oid = repo.commit(None, &sig, &sig, &msg, &tree, &[&ours, &theirs])?;

    move_branch(repo, branch, oid, &msg)?;
    debug!("merged {} into {} as {}", theirs.id(), branch, oid);
    Ok(oid)
}

fn conflict_paths(index: &Index) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// The repository's configured identity, or a fixed fallback when
/// `user.name` / `user.email` are unset.
fn signature(repo: &Repository) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig),
        Err(_) => Ok(Signature::now("reposync", "reposync@localhost")?),
    }
}
