use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ActorId, DomainError, DomainResult, Entity};

/// A party that can be held responsible for stock movements.
///
/// The ledger only keeps the `ActorId`; the actor's lifecycle is owned by the
/// registry that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            created_at,
        })
    }
}

impl Entity for Actor {
    type Id = ActorId;

    fn id(&self) -> ActorId {
        self.id
    }
}
