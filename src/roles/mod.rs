pub mod permissions;

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of roles. Privilege grows from `User` to `Admin`.
///
/// The lowercase string (`"user"`, `"moderator"`, `"admin"`) is the only representation
/// used on the wire and in configuration, and it is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "moderator")]
    Moderator,
    #[serde(rename = "admin")]
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("unknown role '{0}', expect one of 'user', 'moderator', 'admin'")]
    Unknown(String),
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Position of the role in the hierarchy. Every role check compares ranks, never
    /// names.
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 1,
            Role::Moderator => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Moderator => "Moderator",
            Role::Admin => "Administrator",
        }
    }

    /// Parses the role claim carried by a session. Claims are not configuration: an
    /// unrecognized value never fails, it falls back to the lowest privilege.
    pub fn from_claim(claim: &str) -> Role {
        match claim.parse() {
            Ok(role) => role,
            Err(_) => {
                warn!("Unrecognized role claim '{claim}', treat as '{}'", Role::User);
                Role::User
            }
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `actual` is at least as privileged as `required`. Higher roles
/// satisfy every lower-role requirement.
pub fn has_role(actual: Role, required: Role) -> bool {
    actual.rank() >= required.rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank() {
        assert_eq!(Role::User.rank(), 1);
        assert_eq!(Role::Moderator.rank(), 2);
        assert_eq!(Role::Admin.rank(), 3);

        for pair in Role::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_has_role() {
        for actual in Role::ALL {
            assert!(has_role(actual, actual), "{actual} should satisfy itself");
            for required in Role::ALL {
                assert_eq!(
                    has_role(actual, required),
                    actual.rank() >= required.rank()
                );
            }
        }

        assert!(has_role(Role::Admin, Role::User));
        assert!(has_role(Role::Moderator, Role::User));
        assert!(!has_role(Role::User, Role::Moderator));
        assert!(!has_role(Role::Moderator, Role::Admin));
    }

    #[test]
    fn test_has_role_monotonic() {
        for role in Role::ALL {
            for required in Role::ALL {
                if !has_role(role, required) {
                    continue;
                }
                for higher in Role::ALL.iter().filter(|r| r.rank() > role.rank()) {
                    assert!(has_role(*higher, required));
                }
            }
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);

        assert_eq!(
            "ADMIN".parse::<Role>(),
            Err(RoleError::Unknown("ADMIN".to_string()))
        );
        assert!("".parse::<Role>().is_err());
        assert!("agency".parse::<Role>().is_err());
    }

    #[test]
    fn test_from_claim() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim("moderator"), Role::Moderator);
        assert_eq!(Role::from_claim("user"), Role::User);

        // Other casings are not the canonical form
        assert_eq!(Role::from_claim("ADMIN"), Role::User);
        assert_eq!(Role::from_claim("Admin"), Role::User);
        assert_eq!(Role::from_claim(""), Role::User);
        assert_eq!(Role::from_claim("root"), Role::User);
    }

    #[test]
    fn test_wire_form() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.to_string(), role.as_str());
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            assert_eq!(Role::from_claim(role.as_str()), role);
        }

        let result: Result<Role, _> = serde_json::from_str("\"Moderator\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Role::User.display_name(), "User");
        assert_eq!(Role::Moderator.display_name(), "Moderator");
        assert_eq!(Role::Admin.display_name(), "Administrator");
    }
}
