use std::sync::Arc;

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", get(get_organization))
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.accounts.get_organization(ctx.actor()).await {
        Ok(org) => (StatusCode::OK, Json(org)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}
