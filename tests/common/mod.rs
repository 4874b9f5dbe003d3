//! Test infrastructure for reposync integration tests.

#![allow(dead_code)]

use git2::{BranchType, Oid, Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary "remote" repository with an initial commit on `main`.
/// Automatically cleaned up when dropped.
pub struct Upstream {
    _temp_dir: TempDir,
    repo: Repository,
}

impl Upstream {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(temp_dir.path(), &opts).unwrap();
        commit_file(&repo, "README.md", "# Test Repo\n", "Initial commit");
        Self {
            _temp_dir: temp_dir,
            repo,
        }
    }

    pub fn url(&self) -> String {
        self.repo.workdir().unwrap().to_str().unwrap().to_string()
    }

    pub fn commit(&self, name: &str, body: &str, msg: &str) -> Oid {
        commit_file(&self.repo, name, body, msg)
    }

    pub fn head(&self) -> Oid {
        self.repo.head().unwrap().target().unwrap()
    }

    pub fn create_branch(&self, name: &str) {
        let head = self.repo.find_commit(self.head()).unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }
}

/// A scratch directory that holds the local clone and its backup sibling.
pub struct Workspace {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn project(&self) -> PathBuf {
        self.root.join("project")
    }

    pub fn backup(&self) -> PathBuf {
        self.root.join("backup_project")
    }
}

/// Write `name`, stage it and commit on top of HEAD.
pub fn commit_file(repo: &Repository, name: &str, body: &str, msg: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), body).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
        .unwrap()
}

/// Commit directly in the local clone at `path`, closing the handle after.
pub fn commit_local(path: &Path, name: &str, body: &str, msg: &str) -> Oid {
    let repo = Repository::open(path).unwrap();
    commit_file(&repo, name, body, msg)
}

pub fn local_tip(path: &Path, branch: &str) -> Oid {
    let repo = Repository::open(path).unwrap();
    let b = repo.find_branch(branch, BranchType::Local).unwrap();
    b.get().target().unwrap()
}
