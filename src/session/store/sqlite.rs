use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::roles::Role;

use super::RoleStore;

/// Role lookup in the application's SQLite user table. The table is owned by the
/// application, this store only reads `email` and `role`.
///
/// Every lookup opens its own read-only connection on the blocking pool, so lookups
/// of concurrent requests never wait on each other.
#[derive(Debug, Clone)]
pub struct SqliteRoleStore {
    path: PathBuf,
    query: String,
}

impl SqliteRoleStore {
    /// Opens the database once to check that it exists and has the table.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        validate_table(table)?;
        let store = Self {
            path: path.to_path_buf(),
            query: format!("SELECT role FROM {table} WHERE email = ?"),
        };

        let conn = store.connect()?;
        conn.prepare(&store.query)
            .with_context(|| format!("check table '{table}'"))?;

        info!("Using sqlite role store: {}, table '{table}'", path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags)
            .with_context(|| format!("open sqlite database '{}'", self.path.display()))
    }

    fn query_role(&self, email: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        debug!("Database find_role: {}, {email}", self.query);
        let role: Option<Option<String>> = conn
            .query_row(&self.query, params![email], |row| row.get(0))
            .optional()?;

        // A user row without role is a plain user
        Ok(role.map(|role| role.unwrap_or_else(|| Role::User.to_string())))
    }
}

#[async_trait]
impl RoleStore for SqliteRoleStore {
    async fn find_role(&self, email: &str) -> Result<Option<String>> {
        let store = self.clone();
        let email = email.to_string();
        tokio::task::spawn_blocking(move || store.query_role(&email))
            .await
            .context("join sqlite query task")?
    }
}

pub(super) fn validate_table(table: &str) -> Result<()> {
    if table.is_empty() {
        bail!("table name should not be empty");
    }
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid table name '{table}', only letters, digits and '_' are allowed");
    }
    Ok(())
}
