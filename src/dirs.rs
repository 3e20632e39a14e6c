use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_NAME: &str = "rolegate";

pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).with_context(|| format!("create directory '{}'", path.display()))
}

/// `/etc/rolegate` when running as root, otherwise `$XDG_CONFIG_HOME/rolegate`
/// falling back to `~/.config/rolegate`.
pub fn config_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(Path::new("/etc").join(APP_NAME));
    }
    user_dir("XDG_CONFIG_HOME", &[".config"])
}

/// `/var/lib/rolegate` when running as root, otherwise `$XDG_DATA_HOME/rolegate`
/// falling back to `~/.local/share/rolegate`.
pub fn data_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(Path::new("/var/lib").join(APP_NAME));
    }
    user_dir("XDG_DATA_HOME", &[".local", "share"])
}

fn user_dir(xdg_var: &str, under_home: &[&str]) -> Result<PathBuf> {
    if let Some(base) = env::var_os(xdg_var).filter(|base| !base.is_empty()) {
        return Ok(PathBuf::from(base).join(APP_NAME));
    }

    let home = env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .context("HOME is not set, pass the config and data paths explicitly")?;
    let mut dir = PathBuf::from(home);
    dir.extend(under_home);
    Ok(dir.join(APP_NAME))
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
