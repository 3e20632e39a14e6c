use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};
use crate::roles::Role;

use super::sqlite::validate_table;
use super::{MemoryRoleStore, SqliteRoleStore, UnionRoleStore};

/// Where to look up the current role of a user, used when roles are re-resolved on
/// every request.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub name: StoreType,

    /// Fixed user table for the memory store, email to role.
    #[serde(default)]
    pub users: HashMap<String, Role>,

    #[serde(default)]
    pub sqlite: SqliteConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SqliteConfig {
    /// Path to the application's database file.
    /// Default: {data_path}/users.db
    #[serde(default)]
    pub path: String,

    /// Table holding the `email` and `role` columns.
    /// Default: "user"
    #[serde(default = "SqliteConfig::default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: StoreType::default(),
            users: HashMap::new(),
            sqlite: SqliteConfig::default(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            table: Self::default_table(),
        }
    }
}

impl CommonConfig for StoreConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        match self.name {
            StoreType::Memory => {
                if self.users.is_empty() {
                    warn!("Memory role store has no users, every session will be rejected");
                }
                Ok(())
            }
            StoreType::Sqlite => self.sqlite.complete(ps).context("sqlite"),
        }
    }
}

impl CommonConfig for SqliteConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        validate_table(&self.table).context("table")?;

        let path = expandenv("path", &self.path)?;
        self.path = if path.is_empty() {
            ps.data_path.join("users.db").display().to_string()
        } else {
            path
        };
        Ok(())
    }
}

impl StoreConfig {
    pub fn build(&self) -> Result<UnionRoleStore> {
        match self.name {
            StoreType::Memory => {
                let store = MemoryRoleStore::new(self.users.clone());
                Ok(UnionRoleStore::Memory(store))
            }
            StoreType::Sqlite => {
                let store = SqliteRoleStore::open(Path::new(&self.sqlite.path), &self.sqlite.table)?;
                Ok(UnionRoleStore::Sqlite(store))
            }
        }
    }
}

impl SqliteConfig {
    fn default_table() -> String {
        String::from("user")
    }
}
