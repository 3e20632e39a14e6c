use crate::roles::permissions::PermissionTable;

/// Read-only state shared by the API handlers.
pub struct ServerContext {
    pub permissions: PermissionTable,
}

impl ServerContext {
    pub fn new(permissions: PermissionTable) -> Self {
        Self { permissions }
    }
}
