//! Identity record storage boundary.
//!
//! The flow consumes users and organizations only through these narrow
//! interfaces. Uniqueness constraints live in the store, not in the caller.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryOrganizationStore, InMemoryUserStore};
pub use r#trait::{OrganizationStore, StoreError, UserStore};
