//! Git integration layer.
//!
//! This module wraps the backend implementation (`git2_backend`) and
//! re-exports the handful of primitives the sync logic is built from:
//! open-or-clone, fetch, ref resolution and branch moves.

mod git2_backend;

pub use git2_backend::{
    Acquired, ORIGIN, Relation, ensure_local_branch, fast_forward, fetch_origin, merge_into,
    open_or_clone, relation, remote_branch_tip,
};
