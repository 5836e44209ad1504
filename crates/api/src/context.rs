use bims_auth::{Permission, Role, authorize};
use bims_core::{ResidentId, UserId};

/// Authenticated request context (identity + roles + optional portal link).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
    roles: Vec<Role>,
    resident_id: Option<ResidentId>,
}

impl AuthContext {
    pub fn new(user_id: UserId, roles: Vec<Role>, resident_id: Option<ResidentId>) -> Self {
        Self {
            user_id,
            roles,
            resident_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Resident record the caller owns (portal accounts only).
    pub fn resident_id(&self) -> Option<ResidentId> {
        self.resident_id
    }

    /// Check the caller holds a permission; handlers call this before acting.
    pub fn require(&self, permission: &str) -> Result<(), bims_auth::AuthzError> {
        authorize(&self.roles, &Permission::new(permission.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_context_passes_any_permission() {
        let ctx = AuthContext::new(UserId::new(), vec![Role::new("admin")], None);
        assert!(ctx.require("residents.write").is_ok());
        assert!(ctx.require("finance.write").is_ok());
    }

    #[test]
    fn resident_context_cannot_write_residents() {
        let ctx = AuthContext::new(
            UserId::new(),
            vec![Role::new("resident")],
            Some(ResidentId::new()),
        );
        assert!(ctx.require("residents.write").is_err());
        assert!(ctx.require("portal.requests.create").is_ok());
    }
}
