//! Turns a raw credential header into a request-scoped [`Actor`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use identity_core::{Actor, IdentityError, IdentityResult};

use crate::credential::{CredentialScheme, parse_authorization};
use crate::token::TokenCodec;

/// Identity behind an API key, as reported by the key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyIdentity {
    pub key_id: String,
    pub organization_id: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiKeyLookupError {
    #[error("api key not found")]
    NotFound,

    #[error("api key store unavailable: {0}")]
    Unavailable(String),
}

/// Extension point for API-key identity resolution.
///
/// Implemented by the persistence layer. The resolver always bounds calls
/// with its configured timeout.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<ApiKeyIdentity, ApiKeyLookupError>;
}

/// Resolves `Bearer` and `ApiKey` credentials.
///
/// The bearer path is pure signature verification with no IO. Only the
/// API-key path may reach an external store.
#[derive(Clone)]
pub struct ActorResolver {
    codec: Arc<TokenCodec>,
    api_keys: Option<Arc<dyn ApiKeyStore>>,
    api_key_timeout: Duration,
}

impl ActorResolver {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            api_keys: None,
            api_key_timeout: Duration::from_secs(1),
        }
    }

    /// Consult `store` for `ApiKey` credentials, giving up after `timeout`.
    pub fn with_api_key_store(mut self, store: Arc<dyn ApiKeyStore>, timeout: Duration) -> Self {
        self.api_keys = Some(store);
        self.api_key_timeout = timeout;
        self
    }

    /// Resolve the raw `Authorization` header value (if any).
    pub async fn resolve(&self, header: Option<&str>) -> IdentityResult<Actor> {
        let credential = parse_authorization(header)?;

        match credential.scheme {
            CredentialScheme::Bearer => self.resolve_bearer(credential.value),
            CredentialScheme::ApiKey => self.resolve_api_key(credential.value).await,
        }
    }

    pub fn resolve_bearer(&self, token: &str) -> IdentityResult<Actor> {
        let claims = self
            .codec
            .verify(token)
            .map_err(|_| IdentityError::InvalidCredential)?;

        Ok(Actor::user(claims.id, claims.organization_id, claims.admin))
    }

    async fn resolve_api_key(&self, key: &str) -> IdentityResult<Actor> {
        let Some(store) = &self.api_keys else {
            // No key store wired: API keys carry no identity and no tenant.
            return Ok(Actor::api_key("", ""));
        };

        let identity = tokio::time::timeout(self.api_key_timeout, store.resolve(key))
            .await
            .map_err(|_| {
                tracing::warn!(
                    timeout_ms = self.api_key_timeout.as_millis() as u64,
                    "api key lookup timed out"
                );
                IdentityError::Timeout
            })?
            .map_err(|e| match e {
                ApiKeyLookupError::NotFound => IdentityError::InvalidCredential,
                ApiKeyLookupError::Unavailable(msg) => IdentityError::fatal(msg),
            })?;

        Ok(Actor::api_key(identity.key_id, identity.organization_id))
    }
}
