use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs;

/// Flags locating the configuration and data directories, shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory holding `server.toml`. Falls back to `$ROLEGATE_CONFIG`, then to
    /// `/etc/rolegate` for root or `$XDG_CONFIG_HOME/rolegate`.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Directory for the role store database. Falls back to `$ROLEGATE_DATA`, then to
    /// `/var/lib/rolegate` for root or `$XDG_DATA_HOME/rolegate`.
    #[arg(long)]
    pub data_path: Option<PathBuf>,
}

impl ConfigArgs {
    /// Reads `<config_path>/<name>.toml`, or the defaults of `T` when that file is absent.
    pub fn load<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned + Default,
    {
        let ps = PathSet::new(self.config_path.clone(), self.data_path.clone())?;
        ps.load_config(name, T::default)
    }
}

/// The resolved, existing directories every config section may refer to.
pub struct PathSet {
    pub config_path: PathBuf,
    pub data_path: PathBuf,
}

impl PathSet {
    pub fn new(config_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Result<Self> {
        let config_path = resolve_dir(config_path, "ROLEGATE_CONFIG", dirs::config_dir)?;
        let data_path = resolve_dir(data_path, "ROLEGATE_DATA", dirs::data_dir)?;
        Ok(Self {
            config_path,
            data_path,
        })
    }

    pub fn load_config<T, F>(&self, name: &str, fallback: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_path.join(format!("{name}.toml"));
        let mut cfg = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str::<T>(&raw)
                .with_context(|| format!("parse '{}'", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("No '{}', running {name} with defaults", path.display());
                fallback()
            }
            Err(err) => return Err(err).with_context(|| format!("read '{}'", path.display())),
        };

        cfg.complete(self)
            .with_context(|| format!("invalid {name} config"))?;
        Ok(cfg)
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self {
            config_path: env::temp_dir().join("rolegate-test").join("config"),
            data_path: env::temp_dir().join("rolegate-test").join("data"),
        }
    }
}

/// Picks the flag, then the environment variable, then the platform default, and
/// creates the directory.
fn resolve_dir(
    flag: Option<PathBuf>,
    env_var: &str,
    default_dir: fn() -> Result<PathBuf>,
) -> Result<PathBuf> {
    let dir = match flag.or_else(|| env::var_os(env_var).map(PathBuf::from)) {
        Some(dir) => dir,
        None => default_dir()?,
    };
    dirs::ensure_dir_exists(&dir)?;
    Ok(dir)
}

/// Every config section validates and normalizes itself once, right after being loaded.
/// Nothing should be mutated after `complete` returns.
pub trait CommonConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// Expands `~` and `$VAR`/`${VAR}` in a config value, failing on unset variables.
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let expanded = shellexpand::full(s.as_ref())
        .with_context(|| format!("expand environment variables in '{name}'"))?;
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expandenv() {
        env::set_var("ROLEGATE_TEST_EXPAND", "hello");
        assert_eq!(
            expandenv("test", "${ROLEGATE_TEST_EXPAND}/world").unwrap(),
            "hello/world"
        );
        assert_eq!(expandenv("test", "plain").unwrap(), "plain");
        assert!(expandenv("test", "${ROLEGATE_TEST_NOT_EXISTS_VAR}").is_err());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = env::temp_dir().join("rolegate-config-test");
        let ps = PathSet::new(Some(dir.join("config")), Some(dir.join("data"))).unwrap();

        let cfg: crate::logs::LogsConfig = ps
            .load_config("not_exists", crate::logs::LogsConfig::default)
            .unwrap();
        assert!(matches!(cfg.level, crate::logs::LogLevel::Info));
    }
}
