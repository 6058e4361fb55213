//! Unauthenticated account endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/authenticate", post(authenticate))
}

pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .sign_up(&body.username, &body.password, &body.organization_name)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn authenticate(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .login(&body.username, &body.password, &body.organization_name)
        .await
    {
        Ok(token) => (StatusCode::OK, Json(dto::TokenResponse { token })).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}
