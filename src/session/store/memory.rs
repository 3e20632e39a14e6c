use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::roles::Role;

use super::RoleStore;

/// Role store backed by a fixed user table, usually taken from the config file.
pub struct MemoryRoleStore {
    users: HashMap<String, Role>,
}

impl MemoryRoleStore {
    pub fn new(users: HashMap<String, Role>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn find_role(&self, email: &str) -> Result<Option<String>> {
        Ok(self.users.get(email).map(|role| role.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_memory_store() {
        let users = vec![
            (String::from("alice@example.com"), Role::Admin),
            (String::from("bob@example.com"), Role::User),
        ];
        let store = MemoryRoleStore::new(users.into_iter().collect());

        assert_eq!(
            store.find_role("alice@example.com").await.unwrap(),
            Some(String::from("admin"))
        );
        assert_eq!(
            store.find_role("bob@example.com").await.unwrap(),
            Some(String::from("user"))
        );
        assert_eq!(store.find_role("carol@example.com").await.unwrap(), None);
    }
}
