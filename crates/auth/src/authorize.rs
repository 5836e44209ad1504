use std::collections::HashSet;

use thiserror::Error;

use crate::{Permission, Role, policy::role_permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a set of roles against a required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(roles: &[Role], required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = roles
        .iter()
        .flat_map(|r| role_permissions(r.as_str()).iter().copied())
        .collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_everything() {
        let roles = vec![Role::new("admin")];
        assert!(authorize(&roles, &Permission::new("finance.write")).is_ok());
    }

    #[test]
    fn explicit_permission_allows() {
        let roles = vec![Role::new("tanod")];
        assert!(authorize(&roles, &Permission::new("incidents.write")).is_ok());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let roles = vec![Role::new("resident")];
        let err = authorize(&roles, &Permission::new("residents.write")).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("residents.write".to_string()));
    }

    #[test]
    fn permissions_union_across_roles() {
        let roles = vec![Role::new("tanod"), Role::new("treasurer")];
        assert!(authorize(&roles, &Permission::new("finance.write")).is_ok());
        assert!(authorize(&roles, &Permission::new("incidents.write")).is_ok());
    }
}
