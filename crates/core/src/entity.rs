//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Persisted identity records (users, organizations) implement this so stores
/// can key them generically.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Soft-deleted records are retained but excluded from normal queries.
    fn is_deleted(&self) -> bool;
}
