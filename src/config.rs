use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sync::SyncOptions;

pub const DEFAULT_BRANCH: &str = "master";

/// Top-level configuration structure loaded from `config.toml`.
///
/// Example TOML:
/// ```toml
/// [defaults]
/// branch = "main"
/// prefetch = true
/// ff_only = false
///
/// [[repos]]
/// url    = "https://github.com/mkklabs/ChatTTS-Plus.git"
/// path   = "ChatTTS-Plus"
/// branch = "main"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

/// Settings applied to every repository unless the entry overrides them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub branch: String,
    pub prefetch: bool,
    pub ff_only: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            prefetch: true,
            ff_only: false,
        }
    }
}

/// A single `[[repos]]` entry.
///
/// `path` is used as written; relative paths resolve against the working
/// directory `reposync` runs in.
#[derive(Debug, Deserialize, Clone)]
pub struct RepoEntry {
    pub url: String,
    pub path: PathBuf,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Config {
    pub fn branch_for<'a>(&'a self, entry: &'a RepoEntry) -> &'a str {
        entry.branch.as_deref().unwrap_or(&self.defaults.branch)
    }

    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            prefetch: self.defaults.prefetch,
            ff_only: self.defaults.ff_only,
        }
    }
}

/// Parse configuration text.
pub fn parse_config(txt: &str) -> Result<Config> {
    toml::from_str(txt).context("failed to parse config.toml")
}

/// Load and parse the configuration file at `path`.
///
/// # Errors
/// - Returns an error naming `path` if it cannot be read.
/// - Returns an error if parsing the TOML fails.
pub fn load_config(path: &Path) -> Result<Config> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    parse_config(&txt)
}
