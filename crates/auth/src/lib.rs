//! `identity-auth`: pure authentication/authorization engine.
//!
//! This crate is intentionally decoupled from HTTP and storage. The only
//! outbound dependency is the optional [`ApiKeyStore`] consulted by the
//! resolver for `ApiKey` credentials.

pub mod credential;
pub mod hasher;
pub mod password;
pub mod policy;
pub mod resolver;
pub mod token;

pub use credential::{CredentialScheme, RawCredential, parse_authorization};
pub use hasher::{HashError, MAX_COST, MAX_PASSWORD_BYTES, MIN_COST, PasswordHasher};
pub use password::{OneTimePassword, generate_password};
pub use policy::{
    Access, Operation, authorize, require_actor_type, require_full_access, scope_to_organization,
    self_user_id,
};
pub use resolver::{ActorResolver, ApiKeyIdentity, ApiKeyLookupError, ApiKeyStore};
pub use token::{ISSUER, TokenClaims, TokenCodec, TokenError};
