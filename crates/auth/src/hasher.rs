//! One-way password hashing (bcrypt).

use thiserror::Error;

use identity_core::IdentityError;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("bcrypt cost {0} is outside {MIN_COST}..={MAX_COST}")]
    InvalidCost(u32),

    #[error("password must not exceed {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<HashError> for IdentityError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::TooLong => IdentityError::validation(err.to_string()),
            other => IdentityError::fatal(other.to_string()),
        }
    }
}

/// Salted, adaptive password hasher with a cost fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Blocking and CPU-bound.
    ///
    /// Input longer than [`MAX_PASSWORD_BYTES`] is rejected rather than
    /// truncated. Otherwise only fails on entropy/resource exhaustion.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::TooLong);
        }
        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError::Hashing(e.to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A mismatch is a normal `false`. A digest that is not valid bcrypt is
    /// also `false` (and logged): it can never match any password.
    /// Over-long input is `false` as well, since [`hash`](Self::hash) never
    /// accepts it, but the digest is still checked to keep timing flat.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let within_limit = plaintext.len() <= MAX_PASSWORD_BYTES;
        match bcrypt::verify(plaintext, digest) {
            Ok(matches) => matches && within_limit,
            Err(e) => {
                tracing::warn!(error = %e, "stored password digest is not valid bcrypt");
                false
            }
        }
    }
}
