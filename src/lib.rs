//! Crate entry point for **reposync**.
//!
//! This library keeps a local directory on the latest commit of a remote
//! branch: clone when absent, otherwise fetch and fast-forward or merge,
//! with a sibling backup that is restored if the update fails.
//!
//! [`sync`] is the core operation; the `cmd_*` functions are the CLI
//! commands built on top of it.

mod backup;
mod config;
mod error;
mod git;
mod list;
mod paths;
mod sync;

pub use backup::{Backup, backup_path_for};
pub use config::{Config, DEFAULT_BRANCH, Defaults, RepoEntry, load_config, parse_config};
pub use error::SyncError;
pub use list::cmd_list;
pub use paths::{paths, reposync_home};
pub use sync::{MergeKind, SyncOptions, SyncOutcome, cmd_all, cmd_sync, sync};
