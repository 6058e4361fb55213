//! Identity error model.

use thiserror::Error;

/// Result type used across the identity layers.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-level error.
///
/// Every authentication and authorization failure is recovered at the
/// operation boundary and surfaced as one of these variants; none of them
/// terminate the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// No credential was supplied with the request.
    #[error("authorization header is not set")]
    MissingCredential,

    /// The credential header is not `<Scheme> <value>` with a known scheme.
    #[error("malformed authorization header")]
    MalformedCredential,

    /// The credential did not verify (bad signature, missing or mistyped claims, unknown key).
    #[error("invalid access token")]
    InvalidCredential,

    /// Login mismatch. Deliberately does not say which part was wrong.
    #[error("invalid username and password combination")]
    InvalidCredentials,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A scoped lookup found nothing.
    #[error("{0} not found")]
    NotFound(String),

    /// The actor is authenticated but not permitted to perform the operation.
    #[error("not allowed")]
    Forbidden,

    /// A store call did not finish within its request-scoped deadline.
    #[error("operation timed out")]
    Timeout,

    /// A request field failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Hashing, signing or storage infrastructure failed.
    #[error("internal error: {0}")]
    Fatal(String),
}

impl IdentityError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// "Not logged in": the caller could not be authenticated (401 semantics).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::MalformedCredential
                | Self::InvalidCredential
                | Self::InvalidCredentials
        )
    }

    /// "Logged in but not permitted" (403 semantics).
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::Forbidden)
    }
}
