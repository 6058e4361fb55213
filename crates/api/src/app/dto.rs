use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use serde::{Deserialize, Serialize};

use identity_auth::OneTimePassword;
use identity_core::{IdentityError, PageRequest};

// -------------------------
// Request DTOs
// -------------------------

/// Body of both sign-up and authenticate.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    pub organization_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub username: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeAdminRequest {
    pub admin: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A generated password, shown to the caller exactly once.
#[derive(Serialize)]
pub struct PasswordResponse {
    pub password: String,
}

impl From<OneTimePassword> for PasswordResponse {
    fn from(password: OneTimePassword) -> Self {
        Self {
            password: password.into_inner(),
        }
    }
}

// -------------------------
// Extraction helpers
// -------------------------

/// Unwrap a JSON body, reporting malformed input as a validation error.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, IdentityError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| IdentityError::validation(rejection.body_text()))
}

pub fn page(
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<PageRequest, IdentityError> {
    query
        .map(|Query(page)| page)
        .map_err(|rejection| IdentityError::validation(rejection.body_text()))
}
