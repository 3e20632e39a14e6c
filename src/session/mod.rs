mod extract;
mod resolver;

pub mod config;
pub mod factory;
pub mod store;
pub mod token;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::roles::Role;

pub use extract::TokenExtractor;
pub use resolver::{RoleRefresh, TokenSessionResolver};

/// Identity of a signed-in caller, as seen by the gate. The gate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Turns the credential carried by a request into a session.
///
/// * `Ok(Some(session))` - The credential is valid.
/// * `Ok(None)` - The credential is well-formed but no longer maps to a user.
/// * `Err(_)` - The credential could not be verified. Callers must treat this exactly
///   like an anonymous request.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_session(&self, token: &str) -> Result<Option<Session>>;
}
