use stockledger_auth::{PrincipalId, Role};
use stockledger_core::ActorId;

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The actor recorded on ledger entries. Same UUID as the token subject.
    pub fn actor_id(&self) -> ActorId {
        ActorId::from_uuid(*self.principal_id.as_uuid())
    }
}
