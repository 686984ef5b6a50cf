use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use stockledger_auth::permissions::ACTORS_MANAGE;
use stockledger_core::ActorId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_actor).get(list_actors))
        .route("/:id", get(get_actor))
}

pub async fn register_actor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::RegisterActorRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ACTORS_MANAGE) {
        return resp;
    }
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let id = match body.id.as_deref().map(str::parse::<ActorId>).transpose() {
        Ok(id) => id.unwrap_or_default(),
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.register_actor(id, &body.name).await {
        Ok(actor) => (StatusCode::CREATED, Json(dto::actor_to_json(&actor))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_actors(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ACTORS_MANAGE) {
        return resp;
    }

    match services.catalog.list_actors().await {
        Ok(actors) => {
            let items: Vec<Value> = actors.iter().map(dto::actor_to_json).collect();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_actor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ACTORS_MANAGE) {
        return resp;
    }
    let Ok(actor_id) = id.parse::<ActorId>() else {
        return errors::invalid_id("actor");
    };

    match services.catalog.get_actor(actor_id).await {
        Ok(actor) => (StatusCode::OK, Json(dto::actor_to_json(&actor))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
