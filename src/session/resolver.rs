use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use crate::roles::Role;

use super::store::{RoleStore, UnionRoleStore};
use super::token::TokenValidator;
use super::{Session, SessionResolver};

/// How the role of a verified token is obtained.
pub enum RoleRefresh {
    /// Trust the role embedded in the token until it expires. No I/O per request, but a
    /// role change only takes effect after the user signs in again.
    Token,
    /// Look the role up in the store on every request. Role changes apply immediately,
    /// at the price of one store query per request.
    Store(UnionRoleStore),
}

pub struct TokenSessionResolver<V: TokenValidator> {
    validator: V,
    refresh: RoleRefresh,
}

impl<V: TokenValidator> TokenSessionResolver<V> {
    pub fn new(validator: V, refresh: RoleRefresh) -> Self {
        Self { validator, refresh }
    }
}

#[async_trait]
impl<V: TokenValidator + Send + Sync> SessionResolver for TokenSessionResolver<V> {
    async fn resolve_session(&self, token: &str) -> Result<Option<Session>> {
        let claims = self.validator.validate_token(token)?;

        let role = match &self.refresh {
            RoleRefresh::Token => claims.role.as_deref().map(Role::from_claim),
            RoleRefresh::Store(store) => {
                let role = store
                    .find_role(&claims.email)
                    .await
                    .with_context(|| format!("find role for '{}'", claims.email))?;
                match role {
                    Some(role) => Some(Role::from_claim(&role)),
                    None => {
                        debug!("User '{}' not found in role store", claims.email);
                        return Ok(None);
                    }
                }
            }
        };

        Ok(Some(Session {
            user_id: claims.user_id,
            email: claims.email,
            role: role.unwrap_or(Role::User),
        }))
    }
}
