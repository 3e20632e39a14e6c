use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::authz::rule::{matches_prefix, validate_path, RuleTable};
use crate::config::{CommonConfig, PathSet};
use crate::roles::Role;

/// Request gate configuration: which paths skip the gate, which are open to anonymous
/// callers and where callers are redirected to.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateConfig {
    /// Requests under these prefixes are never gated, the session is not even
    /// resolved.
    /// Default: ["/_next", "/static", "/.well-known", "/healthz"]
    #[serde(default = "GateConfig::default_bypass_prefixes")]
    pub bypass_prefixes: Vec<String>,

    /// Skip paths whose last segment looks like a file name (contains a '.').
    /// Default: true
    #[serde(default = "GateConfig::default_bypass_file_paths")]
    pub bypass_file_paths: bool,

    /// Exact paths open to anonymous callers.
    #[serde(default = "GateConfig::default_public_paths")]
    pub public_paths: Vec<String>,

    /// Path prefixes open to anonymous callers.
    /// Default: ["/auth/"]
    #[serde(default = "GateConfig::default_public_prefixes")]
    pub public_prefixes: Vec<String>,

    /// Signed-in callers visiting the landing page or any page under `auth_prefix`
    /// are sent to their dashboard.
    /// Default: "/"
    #[serde(default = "GateConfig::default_landing_path")]
    pub landing_path: String,

    /// Default: "/auth"
    #[serde(default = "GateConfig::default_auth_prefix")]
    pub auth_prefix: String,

    /// Default: "/auth/signin"
    #[serde(default = "GateConfig::default_signin_path")]
    pub signin_path: String,

    /// Where signed-in callers without enough privilege are sent, unless the matching
    /// rule says otherwise.
    /// Default: "/unauthorized"
    #[serde(default = "GateConfig::default_unauthorized_path")]
    pub unauthorized_path: String,

    #[serde(default)]
    pub dashboards: Dashboards,
}

/// Home page of every role.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Dashboards {
    #[serde(default = "Dashboards::default_user")]
    pub user: String,

    #[serde(default = "Dashboards::default_moderator")]
    pub moderator: String,

    #[serde(default = "Dashboards::default_admin")]
    pub admin: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bypass_prefixes: Self::default_bypass_prefixes(),
            bypass_file_paths: Self::default_bypass_file_paths(),
            public_paths: Self::default_public_paths(),
            public_prefixes: Self::default_public_prefixes(),
            landing_path: Self::default_landing_path(),
            auth_prefix: Self::default_auth_prefix(),
            signin_path: Self::default_signin_path(),
            unauthorized_path: Self::default_unauthorized_path(),
            dashboards: Dashboards::default(),
        }
    }
}

impl Default for Dashboards {
    fn default() -> Self {
        Self {
            user: Self::default_user(),
            moderator: Self::default_moderator(),
            admin: Self::default_admin(),
        }
    }
}

impl CommonConfig for GateConfig {
    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        for prefix in self.bypass_prefixes.iter() {
            validate_path(prefix).context("bypass_prefixes")?;
        }
        for path in self.public_paths.iter() {
            validate_path(path).context("public_paths")?;
        }
        for prefix in self.public_prefixes.iter() {
            validate_path(prefix).context("public_prefixes")?;
        }
        validate_path(&self.landing_path).context("landing_path")?;
        validate_path(&self.auth_prefix).context("auth_prefix")?;
        validate_path(&self.signin_path).context("signin_path")?;
        validate_path(&self.unauthorized_path).context("unauthorized_path")?;

        for role in Role::ALL {
            let dashboard = self.dashboards.dashboard_of(role);
            validate_path(dashboard).with_context(|| format!("dashboards.{role}"))?;
            // A dashboard the gate redirects away from would loop forever
            if dashboard == self.landing_path || matches_prefix(dashboard, &self.auth_prefix) {
                bail!(
                    "dashboards.{role}: '{dashboard}' should not be the landing page or under '{}'",
                    self.auth_prefix
                );
            }
        }

        Ok(())
    }
}

impl GateConfig {
    /// Checks the redirect targets against the path rules. A target the redirected
    /// caller is not allowed to open would send them around in circles.
    pub fn check_rules(&self, rules: &RuleTable) -> Result<()> {
        // Only anonymous callers are sent to sign in
        if let Some(rule) = rules.find(&self.signin_path) {
            bail!(
                "signin_path '{}' is covered by rule '{}'",
                self.signin_path,
                rule.prefix()
            );
        }

        // Denied callers are signed in, but may hold the lowest role
        let denied_targets = rules
            .rules()
            .iter()
            .filter_map(|rule| rule.redirect_to())
            .chain([self.unauthorized_path.as_str()]);
        for target in denied_targets {
            if let Some(rule) = rules.find(target) {
                if !rule.required().is_satisfied_by(Role::User) {
                    bail!(
                        "unauthorized page '{target}' is covered by rule '{}', which denies role {}",
                        rule.prefix(),
                        Role::User
                    );
                }
            }
        }

        for role in Role::ALL {
            let dashboard = self.dashboards.dashboard_of(role);
            if let Some(rule) = rules.find(dashboard) {
                if !rule.required().is_satisfied_by(role) {
                    bail!(
                        "dashboards.{role}: '{dashboard}' is covered by rule '{}', which denies role {role}",
                        rule.prefix()
                    );
                }
            }
        }

        Ok(())
    }

    pub fn default_bypass_prefixes() -> Vec<String> {
        vec![
            String::from("/_next"),
            String::from("/static"),
            String::from("/.well-known"),
            String::from("/healthz"),
        ]
    }

    pub fn default_bypass_file_paths() -> bool {
        true
    }

    pub fn default_public_paths() -> Vec<String> {
        [
            "/",
            "/auth/signin",
            "/auth/signup",
            "/auth/error",
            "/about-us",
            "/contact-us",
            "/privacy",
            "/terms",
            "/unauthorized",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn default_public_prefixes() -> Vec<String> {
        vec![String::from("/auth/")]
    }

    pub fn default_landing_path() -> String {
        String::from("/")
    }

    pub fn default_auth_prefix() -> String {
        String::from("/auth")
    }

    pub fn default_signin_path() -> String {
        String::from("/auth/signin")
    }

    pub fn default_unauthorized_path() -> String {
        String::from("/unauthorized")
    }
}

impl Dashboards {
    pub fn dashboard_of(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user,
            Role::Moderator => &self.moderator,
            Role::Admin => &self.admin,
        }
    }

    pub fn default_user() -> String {
        String::from("/user/dashboard")
    }

    pub fn default_moderator() -> String {
        String::from("/moderator/dashboard")
    }

    pub fn default_admin() -> String {
        String::from("/admin/dashboard")
    }
}
