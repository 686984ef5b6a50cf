use axum::{Router, routing::get};

pub mod actors;
pub mod history;
pub mod items;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/items", items::router())
        .nest("/history", history::router())
        .nest("/actors", actors::router())
}
