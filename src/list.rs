use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::{Config, load_config};

/// Format one line per configured repository:
/// `- <path> <- <url> [<branch>]`.
pub fn format_repos(cfg: &Config) -> Vec<String> {
    cfg.repos
        .iter()
        .map(|r| {
            format!(
                "- {} <- {} [{}]",
                r.path.display().to_string().bold(),
                r.url,
                cfg.branch_for(r).cyan()
            )
        })
        .collect()
}

/// CLI command: print the repositories listed in the configuration file.
///
/// Example output:
/// ```text
/// - ChatTTS-Plus <- https://github.com/mkklabs/ChatTTS-Plus.git [main]
/// ```
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or parsed.
pub fn cmd_list(config: &Path) -> Result<()> {
    let cfg = load_config(config)?;
    for line in format_repos(&cfg) {
        println!("{}", line);
    }
    Ok(())
}
