use anyhow::Result;
use std::io;
use std::path::{Component, Path};
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub config: PathBuf,
}

pub fn reposync_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty());
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join("reposync"))
}

pub fn paths() -> Result<Paths> {
    let home = reposync_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
        home,
    })
}

/// Make `path` absolute against the working directory and fold away `.`
/// and `..` components without touching the filesystem.
///
/// Missing intermediate directories are fine: `project/sub/..` is
/// `<cwd>/project` whether `sub` exists or not. `..` at the root stays at
/// the root.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(comp.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                }
            }
        }
    }
    Ok(out)
}
