use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::Role;

/// A named capability. Capabilities are not derived from rank, each role lists its own
/// in the [`PermissionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ManageUsers,
    ManageContent,
    ViewAnalytics,
    ManageSettings,
    DeleteContent,
    AccessAdminPanel,
}

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::ViewDashboard,
        Permission::ManageUsers,
        Permission::ManageContent,
        Permission::ViewAnalytics,
        Permission::ManageSettings,
        Permission::DeleteContent,
        Permission::AccessAdminPanel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::ManageUsers => "manage_users",
            Permission::ManageContent => "manage_content",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageSettings => "manage_settings",
            Permission::DeleteContent => "delete_content",
            Permission::AccessAdminPanel => "access_admin_panel",
        }
    }
}

impl FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.iter().find(|p| p.as_str() == s) {
            Some(p) => Ok(*p),
            None => bail!("unknown permission '{s}'"),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full capability record of one role. Every field is required when deserialized,
/// so a record is never partially populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionSet {
    pub view_dashboard: bool,
    pub manage_users: bool,
    pub manage_content: bool,
    pub view_analytics: bool,
    pub manage_settings: bool,
    pub delete_content: bool,
    pub access_admin_panel: bool,
}

impl PermissionSet {
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewDashboard => self.view_dashboard,
            Permission::ManageUsers => self.manage_users,
            Permission::ManageContent => self.manage_content,
            Permission::ViewAnalytics => self.view_analytics,
            Permission::ManageSettings => self.manage_settings,
            Permission::DeleteContent => self.delete_content,
            Permission::AccessAdminPanel => self.access_admin_panel,
        }
    }
}

/// Role to capability matrix. Built once at startup, then only shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionTable {
    pub user: PermissionSet,
    pub moderator: PermissionSet,
    pub admin: PermissionSet,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PermissionTable {
    pub const fn standard() -> Self {
        Self {
            user: PermissionSet {
                view_dashboard: true,
                manage_users: false,
                manage_content: true,
                view_analytics: false,
                manage_settings: false,
                delete_content: false,
                access_admin_panel: false,
            },
            moderator: PermissionSet {
                view_dashboard: true,
                manage_users: false,
                manage_content: true,
                view_analytics: true,
                manage_settings: false,
                delete_content: true,
                access_admin_panel: false,
            },
            admin: PermissionSet {
                view_dashboard: true,
                manage_users: true,
                manage_content: true,
                view_analytics: true,
                manage_settings: true,
                delete_content: true,
                access_admin_panel: true,
            },
        }
    }

    pub fn permissions_of(&self, role: Role) -> &PermissionSet {
        match role {
            Role::User => &self.user,
            Role::Moderator => &self.moderator,
            Role::Admin => &self.admin,
        }
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.permissions_of(role).allows(permission)
    }
}
