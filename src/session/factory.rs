use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use super::config::{RoleSource, SessionConfig};
use super::{RoleRefresh, SessionResolver, TokenExtractor, TokenSessionResolver};

/// Builds the session side of the gate: how tokens are found and how they are turned
/// into sessions.
pub struct SessionFactory<'a> {
    cfg: &'a SessionConfig,
}

impl<'a> SessionFactory<'a> {
    pub fn new(cfg: &'a SessionConfig) -> Self {
        Self { cfg }
    }

    pub fn build_extractor(&self) -> TokenExtractor {
        TokenExtractor::new(self.cfg.cookie_name.clone())
    }

    pub fn build_resolver(&self) -> Result<Arc<dyn SessionResolver>> {
        let validator = self
            .cfg
            .token
            .build_validator()
            .context("init token validator")?;

        let refresh = match self.cfg.role_source {
            RoleSource::Token => {
                info!("Roles are read from session tokens");
                RoleRefresh::Token
            }
            RoleSource::Store => {
                info!("Roles are looked up in the role store on every request");
                let store = self.cfg.store.build().context("init role store")?;
                RoleRefresh::Store(store)
            }
        };

        Ok(Arc::new(TokenSessionResolver::new(validator, refresh)))
    }
}
