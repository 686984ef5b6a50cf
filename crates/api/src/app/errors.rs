use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use stockledger_core::DomainError;
use stockledger_infra::{ApplyError, CatalogError, HistoryError, StoreError};
use stockledger_inventory::MovementError;

pub fn apply_error_to_response(err: ApplyError) -> axum::response::Response {
    match err {
        ApplyError::Rejected(e) => movement_error_to_response(e),
        ApplyError::Store(e) => store_error_to_response(e),
    }
}

pub fn movement_error_to_response(err: MovementError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        MovementError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        MovementError::MissingField(_) => json_error(StatusCode::BAD_REQUEST, "missing_field", message),
        MovementError::InvalidQuantity(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", message)
        }
        MovementError::InsufficientStock {
            available,
            requested,
        } => json_error_with(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            message,
            json!({ "available": available, "requested": requested }),
        ),
        MovementError::UnknownActor(_) => json_error(StatusCode::FORBIDDEN, "unknown_actor", message),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Invalid(e) => domain_error_to_response(e),
        e @ (CatalogError::ItemNotFound(_) | CatalogError::ActorNotFound(_)) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        CatalogError::Store(e) => store_error_to_response(e),
    }
}

pub fn history_error_to_response(err: HistoryError) -> axum::response::Response {
    match err {
        e @ HistoryError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        HistoryError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) | StoreError::Duplicate(msg) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        e @ (StoreError::Corrupt(_) | StoreError::Unavailable(_)) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

/// A request body that did not deserialize into the expected shape.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    json_error_with(status, code, message, json!({}))
}

/// Like [`json_error`], merging the fields of `extra` into the body.
pub fn json_error_with(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    extra: Value,
) -> axum::response::Response {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (status, axum::Json(body)).into_response()
}
