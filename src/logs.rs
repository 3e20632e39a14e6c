use std::collections::BTreeMap;
use std::io::{self, IsTerminal};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LogsConfig {
    #[serde(default)]
    pub target: LogTarget,

    #[serde(default)]
    pub level: LogLevel,

    /// Per module overrides, e.g. `"rolegate::gate" = "debug"` to trace every
    /// decision without turning on debug logs for the whole server.
    #[serde(default)]
    pub modules: BTreeMap<String, LogLevel>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl CommonConfig for LogsConfig {
    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if let Some(module) = self.modules.keys().find(|m| m.trim().is_empty()) {
            bail!("invalid module name '{module}' in logs.modules");
        }
        Ok(())
    }
}

impl LogsConfig {
    /// Installs the global logger. Must be called once, before the server starts.
    pub fn init(&self) -> Result<()> {
        let colored = match self.target {
            LogTarget::Stdout => io::stdout().is_terminal(),
            LogTarget::Stderr => io::stderr().is_terminal(),
        };
        let colors = ColoredLevelConfig::new()
            .info(Color::Green)
            .debug(Color::Magenta);

        let mut dispatch = fern::Dispatch::new()
            .format(move |out, message, record| {
                let time = humantime::format_rfc3339_millis(SystemTime::now());
                if colored {
                    let level = colors.color(record.level());
                    out.finish(format_args!("{time} {level:<5} {message}"))
                } else {
                    let level = record.level();
                    out.finish(format_args!("{time} {level:<5} {message}"))
                }
            })
            .level(self.level.into())
            // one line per accepted connection otherwise
            .level_for("actix_server", LevelFilter::Warn);
        for (module, level) in self.modules.iter() {
            dispatch = dispatch.level_for(module.clone(), (*level).into());
        }

        let dispatch = match self.target {
            LogTarget::Stdout => dispatch.chain(io::stdout()),
            LogTarget::Stderr => dispatch.chain(io::stderr()),
        };
        dispatch.apply().context("install logger")
    }
}
