pub mod config;
pub mod rule;

use thiserror::Error;

use crate::roles::Role;

/// Errors in the authorization setup. These are raised while rules are registered,
/// never while a request is being decided.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("required roles should not be empty")]
    EmptyRoles,

    #[error("path prefix should not be empty")]
    EmptyPrefix,

    #[error("path '{0}' should start with '/'")]
    RelativePath(String),
}

/// A non-empty set of roles allowed through a gate.
///
/// Roles are linearly ordered, so the set is satisfied by any caller ranking at least
/// as high as its least privileged member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredRoles {
    roles: Vec<Role>,
    minimum: Role,
}

impl RequiredRoles {
    pub fn new<I>(roles: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = Role>,
    {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort_by_key(|r| r.rank());
        roles.dedup();

        let minimum = match roles.first() {
            Some(role) => *role,
            None => return Err(RuleError::EmptyRoles),
        };

        Ok(Self { roles, minimum })
    }

    /// Only admins.
    pub fn admin() -> Self {
        Self::single(Role::Admin)
    }

    /// Moderators and admins.
    pub fn moderator() -> Self {
        Self {
            roles: vec![Role::Moderator, Role::Admin],
            minimum: Role::Moderator,
        }
    }

    /// Any signed-in user.
    pub fn user() -> Self {
        Self {
            roles: Role::ALL.to_vec(),
            minimum: Role::User,
        }
    }

    pub fn single(role: Role) -> Self {
        Self {
            roles: vec![role],
            minimum: role,
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn minimum(&self) -> Role {
        self.minimum
    }

    pub fn is_satisfied_by(&self, role: Role) -> bool {
        role.rank() >= self.minimum.rank()
    }
}

/// Outcome of checking one caller against one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    /// No session. `callback` is where sign-in should return the caller to.
    RedirectToSignIn { callback: String },
    /// Signed in, but ranked below the requirement.
    RedirectToUnauthorized,
}

pub fn decide(caller: Option<Role>, required: &RequiredRoles, callback: &str) -> Decision {
    let role = match caller {
        Some(role) => role,
        None => {
            return Decision::RedirectToSignIn {
                callback: callback.to_string(),
            }
        }
    };

    if required.is_satisfied_by(role) {
        return Decision::Continue;
    }

    Decision::RedirectToUnauthorized
}
