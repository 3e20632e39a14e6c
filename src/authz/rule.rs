use crate::roles::Role;

use super::{decide, Decision, RequiredRoles, RuleError};

/// Routes under `prefix` require one of the `required` roles. A denied caller is sent
/// to `redirect_to` when set, otherwise to the gate's unauthorized page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    prefix: String,
    required: RequiredRoles,
    redirect_to: Option<String>,
}

impl PathRule {
    pub fn new(
        prefix: impl Into<String>,
        required: RequiredRoles,
        redirect_to: Option<String>,
    ) -> Result<Self, RuleError> {
        let prefix = prefix.into();
        validate_path(&prefix)?;
        if let Some(target) = redirect_to.as_ref() {
            validate_path(target)?;
        }

        Ok(Self {
            prefix,
            required,
            redirect_to,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn required(&self) -> &RequiredRoles {
        &self.required
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    pub fn matches(&self, path: &str) -> bool {
        matches_prefix(path, &self.prefix)
    }

    pub fn decide(&self, caller: Option<Role>, callback: &str) -> Decision {
        decide(caller, &self.required, callback)
    }
}

/// Ordered rules, the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<PathRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<PathRule>) -> Self {
        Self { rules }
    }

    pub fn find(&self, path: &str) -> Option<&PathRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Prefix match on whole path segments: `/admin` covers `/admin` and `/admin/users`
/// but not `/administrator`. A prefix ending with `/` is matched as-is.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

pub fn validate_path(path: &str) -> Result<(), RuleError> {
    if path.is_empty() {
        return Err(RuleError::EmptyPrefix);
    }
    if !path.starts_with('/') {
        return Err(RuleError::RelativePath(path.to_string()));
    }
    Ok(())
}
