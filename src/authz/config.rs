use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};
use crate::roles::permissions::PermissionTable;
use crate::roles::Role;

use super::rule::{PathRule, RuleTable};
use super::RequiredRoles;

/// Authorization related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthzConfig {
    /// Ordered path rules, the first rule whose prefix matches the request path is
    /// applied. Every rule must list at least one role.
    /// Default: `/admin` for admin, `/moderator` for moderator and admin, `/user` for
    /// every signed-in role.
    #[serde(default = "AuthzConfig::default_rules")]
    pub rules: Vec<RuleConfig>,

    /// Role to capability matrix. When set, every role and every capability must be
    /// listed.
    #[serde(default = "PermissionTable::standard")]
    pub permissions: PermissionTable,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuleConfig {
    pub prefix: String,

    pub roles: Vec<Role>,

    #[serde(default)]
    pub redirect_to: Option<String>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            rules: Self::default_rules(),
            permissions: PermissionTable::standard(),
        }
    }
}

impl CommonConfig for AuthzConfig {
    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        // Build once here so that a broken rule stops the startup
        self.build_rules()?;
        Ok(())
    }
}

impl AuthzConfig {
    pub fn build_rules(&self) -> Result<RuleTable> {
        let mut rules = Vec::with_capacity(self.rules.len());
        for (idx, rule) in self.rules.iter().enumerate() {
            let required = RequiredRoles::new(rule.roles.iter().copied())
                .with_context(|| format!("rules[{idx}] '{}'", rule.prefix))?;
            let rule = PathRule::new(rule.prefix.clone(), required, rule.redirect_to.clone())
                .with_context(|| format!("rules[{idx}]"))?;
            rules.push(rule);
        }
        Ok(RuleTable::new(rules))
    }

    pub fn default_rules() -> Vec<RuleConfig> {
        vec![
            RuleConfig {
                prefix: String::from("/admin"),
                roles: vec![Role::Admin],
                redirect_to: None,
            },
            RuleConfig {
                prefix: String::from("/moderator"),
                roles: vec![Role::Moderator, Role::Admin],
                redirect_to: None,
            },
            RuleConfig {
                prefix: String::from("/user"),
                roles: vec![Role::User, Role::Moderator, Role::Admin],
                redirect_to: None,
            },
        ]
    }
}
