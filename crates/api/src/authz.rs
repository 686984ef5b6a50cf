//! Capability checks at the HTTP boundary, before any core call.

use axum::http::StatusCode;
use axum::response::Response;

use stockledger_auth::{Permission, Principal, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

pub fn resolve_principal(ctx: &PrincipalContext) -> Principal {
    Principal::from_roles(ctx.principal_id(), ctx.roles().to_vec())
}

/// Returns a ready 403 response when the principal lacks `permission`.
pub fn require(ctx: &PrincipalContext, permission: &'static str) -> Result<(), Response> {
    authorize(&resolve_principal(ctx), &Permission::new(permission)).map_err(|e| {
        tracing::warn!(principal_id = %ctx.principal_id(), permission, "request forbidden");
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}
