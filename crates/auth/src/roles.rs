use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::{
    HISTORY_READ, ITEMS_READ, MOVEMENTS_ENTRY, MOVEMENTS_EXIT, Permission, WILDCARD,
};

/// Role identifier used for RBAC. Opaque at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const OPERATOR: &'static str = "operator";
    pub const VIEWER: &'static str = "viewer";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn role_permissions(role: &str) -> &'static [&'static str] {
    match role {
        Role::ADMIN => &[WILDCARD],
        Role::OPERATOR => &[ITEMS_READ, MOVEMENTS_ENTRY, MOVEMENTS_EXIT, HISTORY_READ],
        Role::VIEWER => &[ITEMS_READ, HISTORY_READ],
        _ => &[],
    }
}

/// Static role policy. Unknown roles grant nothing.
///
/// Returns a sorted, de-duplicated permission set.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut names: Vec<&'static str> = roles
        .iter()
        .flat_map(|r| role_permissions(r.as_str()).iter().copied())
        .collect();
    names.sort_unstable();
    names.dedup();
    names.into_iter().map(Permission::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{ACTORS_MANAGE, ITEMS_CREATE, ITEMS_DELETE};

    fn names(roles: &[&'static str]) -> Vec<String> {
        let roles: Vec<Role> = roles.iter().map(|r| Role::new(*r)).collect();
        permissions_for_roles(&roles)
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }

    #[test]
    fn admin_gets_wildcard() {
        assert_eq!(names(&["admin"]), vec!["*"]);
    }

    #[test]
    fn operator_can_move_stock_but_not_manage() {
        let perms = names(&["operator"]);
        assert!(perms.iter().any(|p| p == MOVEMENTS_EXIT));
        assert!(
            !perms
                .iter()
                .any(|p| p == ITEMS_CREATE || p == ITEMS_DELETE || p == ACTORS_MANAGE)
        );
    }

    #[test]
    fn overlapping_roles_are_deduplicated() {
        assert_eq!(names(&["viewer", "operator", "viewer"]).len(), 4);
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert!(names(&["root", "Admin"]).is_empty());
    }
}
