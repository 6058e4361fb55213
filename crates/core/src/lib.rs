//! `identity-core`: identity domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the request-scoped `Actor`, the persisted `User` and
//! `Organization` records, and the error taxonomy shared by every layer.

pub mod actor;
pub mod entity;
pub mod error;
pub mod id;
pub mod organization;
pub mod page;
pub mod user;

pub use actor::{Actor, ActorType};
pub use entity::Entity;
pub use error::{IdentityError, IdentityResult};
pub use id::{OrganizationId, UserId};
pub use organization::Organization;
pub use page::PageRequest;
pub use user::User;
