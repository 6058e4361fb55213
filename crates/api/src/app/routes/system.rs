use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the resolved actor (debugging aid for credential setup).
pub async fn whoami(Extension(ctx): Extension<ActorContext>) -> impl IntoResponse {
    Json(ctx.actor().clone())
}
