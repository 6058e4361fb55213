use std::sync::Arc;

use axum::{
    extract::{
        Extension, Json, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Router,
};

use identity_core::{IdentityError, PageRequest, UserId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(add_user))
        .route("/me", get(get_self))
        .route("/me/password", put(change_own_password))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/admin", put(change_admin))
        .route("/:id/password", put(reset_password))
}

pub async fn get_self(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.accounts.get_self(ctx.actor()).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn change_own_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    payload: Result<Json<dto::ChangePasswordRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .change_own_password(ctx.actor(), &body.password)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn add_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    payload: Result<Json<dto::AddUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .add_user(ctx.actor(), &body.username, body.admin)
        .await
    {
        Ok(password) => {
            (StatusCode::CREATED, Json(dto::PasswordResponse::from(password))).into_response()
        }
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> axum::response::Response {
    let page = match dto::page(query) {
        Ok(p) => p,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services.accounts.list_users(ctx.actor(), page).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .get_user_in_organization(ctx.actor(), &user_id)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services.accounts.delete_user(ctx.actor(), &user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn change_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ChangeAdminRequest>, JsonRejection>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::identity_error_to_response(e),
    };
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services
        .accounts
        .change_admin(ctx.actor(), &user_id, body.admin)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::identity_error_to_response(e),
    };

    match services.accounts.reset_password(ctx.actor(), &user_id).await {
        Ok(password) => {
            (StatusCode::OK, Json(dto::PasswordResponse::from(password))).into_response()
        }
        Err(e) => errors::identity_error_to_response(e),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, IdentityError> {
    raw.parse::<UserId>()
}
