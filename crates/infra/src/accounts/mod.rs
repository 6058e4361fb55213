//! Account lifecycle orchestration (sign-up, login, user administration).
//!
//! Stateless: one operation per call, each bounded by a request-scoped
//! deadline. Stores are reached only through [`crate::store`] traits.

mod service;

#[cfg(test)]
mod tests;

use std::time::Duration;

pub use service::AccountService;

/// Request-scoped deadlines for store-backed operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StoreTimeouts {
    /// Read-only lookups (login, get, list).
    pub read: Duration,
    /// Writes and multi-step operations (sign-up, add, reset, delete).
    pub write: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(1),
            write: Duration::from_secs(5),
        }
    }
}
