use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use identity_auth::ActorResolver;
use identity_core::{IdentityError, IdentityResult};

use crate::app::errors;
use crate::context::ActorContext;

#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<ActorResolver>,
}

/// Resolve the `Authorization` header into an [`ActorContext`].
///
/// Any resolution failure short-circuits with a JSON 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let actor = match authorization_header(req.headers()) {
        Ok(header) => state.resolver.resolve(header).await,
        Err(e) => Err(e),
    }
    .map_err(errors::identity_error_to_response)?;

    req.extensions_mut().insert(ActorContext::new(actor));
    Ok(next.run(req).await)
}

fn authorization_header(headers: &HeaderMap) -> IdentityResult<Option<&str>> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| IdentityError::MalformedCredential),
    }
}
