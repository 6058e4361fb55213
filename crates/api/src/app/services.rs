//! Service wiring: everything a handler needs, built once at startup.

use std::sync::Arc;

use thiserror::Error;

use identity_auth::{ActorResolver, HashError, PasswordHasher, TokenCodec, TokenError};
use identity_infra::store::{InMemoryOrganizationStore, InMemoryUserStore};
use identity_infra::{AccountService, Settings};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token signing key rejected: {0}")]
    SigningKey(#[from] TokenError),

    #[error("password hasher rejected: {0}")]
    Hasher(#[from] HashError),
}

pub struct AppServices {
    pub accounts: AccountService,
    pub resolver: Arc<ActorResolver>,
}

impl AppServices {
    /// In-memory wiring (dev/test). No API-key store is configured, so
    /// `ApiKey` credentials resolve to an unscoped key actor.
    pub fn in_memory(settings: &Settings) -> Result<Self, StartupError> {
        let codec = Arc::new(TokenCodec::new(settings.signing_key.as_bytes())?);
        let hasher = PasswordHasher::new(settings.bcrypt_cost)?;

        let accounts = AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryOrganizationStore::new()),
            hasher,
            codec.clone(),
            settings.store_timeouts,
        );

        tracing::info!(
            bcrypt_cost = hasher.cost(),
            read_timeout_ms = settings.store_timeouts.read.as_millis() as u64,
            write_timeout_ms = settings.store_timeouts.write.as_millis() as u64,
            "services wired (in-memory stores)"
        );

        Ok(Self {
            accounts,
            resolver: Arc::new(ActorResolver::new(codec)),
        })
    }
}
