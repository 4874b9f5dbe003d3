use std::path::PathBuf;

use crate::config::Config;

/// A single repository synchronization job.
///
/// Each job corresponds to one `[[repos]]` entry in `config.toml` with the
/// branch default already applied.
#[derive(Clone, Debug)]
pub struct SyncJob {
    pub display: String,
    pub url: String,
    pub path: PathBuf,
    pub branch: String,
}

/// Build synchronization jobs from the parsed configuration.
///
/// Entries with an empty `url` are skipped.
pub fn build_jobs(cfg: &Config) -> Vec<SyncJob> {
    cfg.repos
        .iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| SyncJob {
            display: r.path.display().to_string(),
            url: r.url.clone(),
            path: r.path.clone(),
            branch: cfg.branch_for(r).to_string(),
        })
        .collect()
}
