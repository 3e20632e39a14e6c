use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::store::config::StoreConfig;
use super::token::config::TokenConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Cookie holding the session token when no `Authorization` header is sent.
    /// Default: "session_token"
    #[serde(default = "SessionConfig::default_cookie_name")]
    pub cookie_name: String,

    /// Where the role of a signed-in user comes from.
    /// Default: token
    #[serde(default = "SessionConfig::default_role_source")]
    pub role_source: RoleSource,

    #[serde(default)]
    pub token: TokenConfig,

    /// Only used when `role_source` is store.
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// The `role` claim of the token.
    #[serde(rename = "token")]
    Token,
    /// The role store, queried on every request.
    #[serde(rename = "store")]
    Store,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: Self::default_cookie_name(),
            role_source: Self::default_role_source(),
            token: TokenConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl CommonConfig for SessionConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.cookie_name.is_empty() {
            bail!("cookie_name is required");
        }

        self.token.complete(ps).context("token")?;
        if let RoleSource::Store = self.role_source {
            self.store.complete(ps).context("store")?;
        }

        Ok(())
    }
}

impl SessionConfig {
    pub fn default_cookie_name() -> String {
        String::from("session_token")
    }

    pub fn default_role_source() -> RoleSource {
        RoleSource::Token
    }
}
