use axum::{Router, routing::get};

pub mod accounts;
pub mod organization;
pub mod system;
pub mod users;

/// Router for all authenticated (organization-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/organization", organization::router())
}
