mod memory;
mod sqlite;

pub mod config;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryRoleStore;
pub use sqlite::SqliteRoleStore;

#[cfg(test)]
pub use sqlite::tests::UserTable;

/// Read-only view of the user database, used to look up the current role of a user.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the raw role string stored for the user, `None` if the user does not
    /// exist.
    async fn find_role(&self, email: &str) -> Result<Option<String>>;
}

pub enum UnionRoleStore {
    Memory(MemoryRoleStore),
    Sqlite(SqliteRoleStore),
}

#[async_trait]
impl RoleStore for UnionRoleStore {
    async fn find_role(&self, email: &str) -> Result<Option<String>> {
        match self {
            UnionRoleStore::Memory(store) => store.find_role(email).await,
            UnionRoleStore::Sqlite(store) => store.find_role(email).await,
        }
    }
}
