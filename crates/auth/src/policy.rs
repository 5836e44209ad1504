//! Role → permission policy.
//!
//! One barangay per deployment; the role set is fixed and small, so the
//! mapping is a static table rather than a stored policy.

/// Permissions granted by a role.
///
/// Unknown roles grant nothing (deny by default).
pub fn role_permissions(role: &str) -> &'static [&'static str] {
    match role {
        "admin" => &["*"],
        "staff" => &[
            "residents.read",
            "residents.write",
            "households.read",
            "households.write",
            "officials.read",
            "officials.write",
            "documents.read",
            "documents.write",
            "incidents.read",
            "incidents.write",
            "inventory.read",
            "finance.read",
        ],
        "treasurer" => &[
            "finance.read",
            "finance.write",
            "inventory.read",
            "inventory.items.write",
            "inventory.items.adjust",
            "officials.read",
        ],
        "tanod" => &["incidents.read", "incidents.write", "residents.read"],
        "resident" => &[
            "portal.requests.create",
            "portal.requests.read",
            "portal.complaints.create",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gets_wildcard() {
        assert_eq!(role_permissions("admin"), &["*"]);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(role_permissions("janitor").is_empty());
    }

    #[test]
    fn treasurer_can_adjust_stock_but_staff_cannot() {
        assert!(role_permissions("treasurer").contains(&"inventory.items.adjust"));
        assert!(!role_permissions("staff").contains(&"inventory.items.adjust"));
    }
}
