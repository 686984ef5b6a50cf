use serde::Serialize;
use thiserror::Error;

use crate::{Permission, PrincipalId, Role, permissions_for_roles};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Resolve permissions through the static role policy.
    pub fn from_roles(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        let permissions = permissions_for_roles(&roles);
        Self {
            principal_id,
            roles,
            permissions,
        }
    }

    pub fn can(&self, required: &Permission) -> bool {
        authorize(self, required).is_ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required)
    {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{HISTORY_READ, ITEMS_CREATE, MOVEMENTS_ENTRY};

    fn principal(role: &'static str) -> Principal {
        Principal::from_roles(PrincipalId::new(), vec![Role::new(role)])
    }

    #[test]
    fn wildcard_allows_everything() {
        let admin = principal("admin");
        assert!(admin.can(&Permission::new(ITEMS_CREATE)));
        assert!(admin.can(&Permission::new("anything.at.all")));
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let viewer = principal("viewer");
        assert!(viewer.can(&Permission::new(HISTORY_READ)));
        assert_eq!(
            authorize(&viewer, &Permission::new(MOVEMENTS_ENTRY)),
            Err(AuthzError::Forbidden(MOVEMENTS_ENTRY.to_string()))
        );
    }

    #[test]
    fn no_roles_means_no_access() {
        let nobody = Principal::from_roles(PrincipalId::new(), Vec::new());
        assert!(!nobody.can(&Permission::new(HISTORY_READ)));
    }
}
