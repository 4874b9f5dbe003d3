//! # reposync
//!
//! **reposync** keeps local clones on the latest commit of a remote branch.
//!
//! Features:
//! - `reposync sync <URL> <PATH> -b <BRANCH>` clones or updates one repository
//! - `reposync all` syncs every repository listed in `config.toml`
//! - `reposync list` shows the configured repositories
//! - `reposync home` prints the reposync config directory
//!
//! Every update is preceded by a `backup_<name>` copy next to the target
//! directory, which is restored if the update fails.
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use reposync::{DEFAULT_BRANCH, SyncOptions, cmd_all, cmd_list, cmd_sync, paths, reposync_home};
use std::path::PathBuf;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "reposync",
    version,
    about = "reposync - keep local clones on the latest remote commit",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    /// Config file (default: $XDG_CONFIG_HOME/reposync/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Clone or update a single repository
    Sync {
        /// Remote repository URL
        url: String,
        /// Local directory
        path: PathBuf,
        /// Branch to track
        #[arg(short, long, default_value = DEFAULT_BRANCH)]
        branch: String,
        /// Compare against the remote-tracking refs as last fetched
        #[arg(long)]
        no_prefetch: bool,
        /// Fail instead of creating a merge commit
        #[arg(long)]
        ff_only: bool,
    },
    /// Sync every repository in config.toml
    All,
    /// List configured repositories
    List,
    /// Print the reposync config directory
    Home,
}

/// Map `-q` / `-v` to a `stderrlog` verbosity.
///
/// `0` logs errors only, the default `1` adds warnings, each `-v` one more level.
fn log_verbosity(quiet: bool, verbose: u8) -> usize {
    if quiet { 0 } else { usize::from(verbose) + 1 }
}

/// CLI entry point.
///
/// Parses arguments with `clap`, sets up `stderrlog`, and executes the
/// selected subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(log_verbosity(cli.quiet, cli.verbose))
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let config = match cli.config {
        Some(p) => p,
        None => paths()?.config,
    };

    let Some(cmd) = cli.cmd else {
        return Ok(());
    };

    match cmd {
        Cmd::Sync {
            url,
            path,
            branch,
            no_prefetch,
            ff_only,
        } => {
            let opts = SyncOptions {
                prefetch: !no_prefetch,
                ff_only,
            };
            cmd_sync(&url, &path, &branch, &opts)
        }
        Cmd::All => cmd_all(&config),
        Cmd::List => cmd_list(&config),
        Cmd::Home => {
            println!("{}", reposync_home()?.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_still_logs_errors() {
        assert_eq!(log_verbosity(true, 0), 0);
        assert_eq!(log_verbosity(true, 3), 0);
    }

    #[test]
    fn each_verbose_flag_adds_a_level() {
        assert_eq!(log_verbosity(false, 0), 1);
        assert_eq!(log_verbosity(false, 2), 3);
    }

    #[test]
    fn quiet_flag_parses() {
        let cli = Cli::try_parse_from(["reposync", "-q", "list"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.cmd, Some(Cmd::List)));
    }
}
