use async_trait::async_trait;
use thiserror::Error;

use identity_core::{IdentityError, Organization, OrganizationId, User, UserId};

/// Store operation error.
///
/// `NotFound` is always distinguishable from infrastructure failure so the
/// flow can turn a miss into the right domain error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => IdentityError::not_found(what),
            StoreError::Conflict(msg) => IdentityError::Conflict(msg),
            StoreError::Unavailable(msg) => IdentityError::Fatal(msg),
        }
    }
}

/// User persistence.
///
/// Every lookup excludes soft-deleted users and is scoped to one
/// organization; there is deliberately no unscoped lookup by id.
///
/// Implementations must:
/// - reject `create_user` with `Conflict` when a non-deleted user with the same
///   username already exists in the same organization (atomically, not
///   check-then-insert)
/// - report misses as `NotFound`
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user_by_id(
        &self,
        organization_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<User, StoreError>;

    async fn find_user_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<User, StoreError>;

    /// Replace a stored user (matched by id, deleted or not).
    async fn update_user(&self, user: &User) -> Result<User, StoreError>;

    async fn count_users_by_org_and_username(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> Result<u64, StoreError>;

    /// Non-deleted users of one organization in creation order.
    async fn list_users_by_org(
        &self,
        organization_id: &OrganizationId,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError>;
}

/// Organization persistence.
///
/// Implementations must reject `create_organization` with `Conflict` when a
/// non-deleted organization with the same name exists (case-sensitive).
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create_organization(
        &self,
        organization: Organization,
    ) -> Result<Organization, StoreError>;

    /// Replace a stored organization (matched by id, deleted or not).
    async fn update_organization(
        &self,
        organization: &Organization,
    ) -> Result<Organization, StoreError>;

    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, StoreError>;

    async fn find_organization_by_id(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Organization, StoreError>;

    async fn count_organizations_by_name(&self, name: &str) -> Result<u64, StoreError>;
}
