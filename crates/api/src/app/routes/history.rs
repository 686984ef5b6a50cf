use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::{Value, json};

use stockledger_auth::permissions::HISTORY_READ;
use stockledger_core::EntryId;
use stockledger_inventory::HistoryFilter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_history))
        .route("/:id", get(get_history_entry))
}

pub async fn list_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::HistoryParams>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, HISTORY_READ) {
        return resp;
    }

    let filter = match HistoryFilter::from_params(
        params.item_id.as_deref(),
        params.operation.as_deref(),
        params.actor_id.as_deref(),
    ) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.history.list_history(&filter).await {
        Ok(entries) => {
            let items: Vec<Value> = entries.iter().map(dto::entry_to_json).collect();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::history_error_to_response(e),
    }
}

pub async fn get_history_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, HISTORY_READ) {
        return resp;
    }
    let Ok(entry_id) = id.parse::<EntryId>() else {
        return errors::invalid_id("history entry");
    };

    match services.history.get_history_entry(entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::history_error_to_response(e),
    }
}
