use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use identity_core::IdentityError;

/// Map a flow/auth error to its HTTP response.
///
/// Authentication failures are 401 and policy denials 403 so clients can
/// tell "not logged in" from "not permitted". Fatal details stay in the logs.
pub fn identity_error_to_response(err: IdentityError) -> axum::response::Response {
    if err.is_authentication_failure() {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string());
    }

    match err {
        IdentityError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        IdentityError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        IdentityError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        IdentityError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        IdentityError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        IdentityError::Timeout => {
            json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string())
        }
        IdentityError::Fatal(msg) => {
            tracing::error!(error = %msg, "request failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
        // Credential variants were handled above.
        other => json_error(StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
