use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Opaque dotted strings (e.g. `inventory.items.read`). The wildcard `"*"`
/// grants everything and is only handed out by the role policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const WILDCARD: &str = "*";

pub const ITEMS_READ: &str = "inventory.items.read";
pub const ITEMS_CREATE: &str = "inventory.items.create";
pub const ITEMS_UPDATE: &str = "inventory.items.update";
pub const ITEMS_DELETE: &str = "inventory.items.delete";
pub const MOVEMENTS_ENTRY: &str = "inventory.movements.entry";
pub const MOVEMENTS_EXIT: &str = "inventory.movements.exit";
pub const HISTORY_READ: &str = "inventory.history.read";
pub const ACTORS_MANAGE: &str = "inventory.actors.manage";
