use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use stockledger_auth::permissions::{
    ITEMS_CREATE, ITEMS_DELETE, ITEMS_READ, ITEMS_UPDATE, MOVEMENTS_ENTRY, MOVEMENTS_EXIT,
};
use stockledger_core::ItemId;
use stockledger_infra::ApplyMovement;
use stockledger_inventory::Operation;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/:id", get(get_item).patch(rename_item).delete(delete_item))
        .route("/:id/entry", post(record_entry))
        .route("/:id/exit", post(record_exit))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ITEMS_CREATE) {
        return resp;
    }
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.catalog.create_item(&body.label, body.quantity).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ITEMS_READ) {
        return resp;
    }

    match services.catalog.list_items().await {
        Ok(items) => {
            let items: Vec<Value> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ITEMS_READ) {
        return resp;
    }
    let Ok(item_id) = id.parse::<ItemId>() else {
        return errors::invalid_id("item");
    };

    match services.catalog.get_item(item_id).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn rename_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::RenameItemRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ITEMS_UPDATE) {
        return resp;
    }
    let Ok(item_id) = id.parse::<ItemId>() else {
        return errors::invalid_id("item");
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.catalog.rename_item(item_id, &body.label).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

/// Removes the item record. Its ledger entries stay readable.
pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, ITEMS_DELETE) {
        return resp;
    }
    let Ok(item_id) = id.parse::<ItemId>() else {
        return errors::invalid_id("item");
    };

    match services.catalog.delete_item(item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn record_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, MOVEMENTS_ENTRY) {
        return resp;
    }
    record_movement(&services, &principal, Operation::Entry, &id, &body).await
}

pub async fn record_exit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, MOVEMENTS_EXIT) {
        return resp;
    }
    record_movement(&services, &principal, Operation::Exit, &id, &body).await
}

async fn record_movement(
    services: &AppServices,
    principal: &PrincipalContext,
    operation: Operation,
    id: &str,
    body: &[u8],
) -> axum::response::Response {
    let Ok(item_id) = id.parse::<ItemId>() else {
        return errors::invalid_id("item");
    };

    // The body is read loosely so that quantity errors come from the core
    // with their usual precedence, whatever the JSON type sent.
    let body: Option<Value> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(body) {
            Ok(v) => Some(v),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string());
            }
        }
    };

    let cmd = ApplyMovement {
        item_id,
        actor_id: principal.actor_id(),
        quantity: dto::movement_quantity(body),
    };

    match services.movements.apply(operation, cmd).await {
        Ok(outcome) => {
            let (message, moved_key) = match operation {
                Operation::Entry => ("Stock entry recorded successfully.", "added"),
                Operation::Exit => ("Stock exit recorded successfully.", "removed"),
            };
            let mut body = json!({
                "message": message,
                "item_id": outcome.item_id.to_string(),
                "entry_id": outcome.entry_id.to_string(),
                "new_total": outcome.new_total,
            });
            body[moved_key] = json!(outcome.quantity.get());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::apply_error_to_response(e),
    }
}
