//! Signed bearer tokens (HS256 JWT).
//!
//! A token carries exactly four claims: `id`, `admin`, `organization_id` and
//! `iss`. Verification requires a valid signature under the service key and
//! all four claims present with the expected JSON types. There is no expiry:
//! tokens stay valid until the signing key rotates.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use identity_core::IdentityError;

/// Issuer tag written into every token. Informational; not checked on verify.
pub const ISSUER: &str = "superstack";

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user) id.
    pub id: String,
    /// Full-access flag.
    pub admin: bool,
    pub organization_id: String,
    pub iss: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing key is empty")]
    EmptyKey,

    #[error("invalid access token")]
    InvalidToken,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for IdentityError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => IdentityError::InvalidCredential,
            other => IdentityError::fatal(other.to_string()),
        }
    }
}

/// Issues and verifies tokens with a symmetric key supplied at construction.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptyKey);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // No registered claim is mandatory; `exp`/`aud` are not part of our tokens.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn issue(
        &self,
        subject_id: &str,
        organization_id: &str,
        full_access: bool,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims {
            id: subject_id.to_string(),
            admin: full_access,
            organization_id: organization_id.to_string(),
            iss: ISSUER.to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and claim shape.
    ///
    /// Any failure (bad signature, wrong algorithm, missing claim, mistyped
    /// claim) collapses into [`TokenError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                TokenError::InvalidToken
            })
    }
}
