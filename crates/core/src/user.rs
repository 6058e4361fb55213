//! Persisted user account.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Actor, ActorType, Entity, OrganizationId, UserId};

/// A user account.
///
/// # Invariants
/// - `username` is unique among non-deleted users of one organization.
/// - Only the password hash is ever stored; it is never serialized.
/// - Deletion is soft: the record is flagged, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// `None` only during sign-up, before the organization exists.
    pub organization_id: Option<OrganizationId>,
    pub admin: bool,
    /// Who created this user; `None` for users created by sign-up.
    pub creator_type: Option<ActorType>,
    pub creator_id: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First user of a new organization. Implicitly full access.
    pub fn founder(username: impl Into<String>, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash,
            organization_id: None,
            admin: true,
            creator_type: None,
            creator_id: String::new(),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// A user added to an existing organization by `creator`.
    pub fn added_by(
        creator: &Actor,
        organization_id: OrganizationId,
        username: impl Into<String>,
        password_hash: String,
        admin: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash,
            organization_id: Some(organization_id),
            admin,
            creator_type: Some(creator.actor_type()),
            creator_id: creator.actor_id().to_string(),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn belongs_to(&self, organization_id: &OrganizationId) -> bool {
        self.organization_id.as_ref() == Some(organization_id)
    }

    pub fn assign_organization(&mut self, organization_id: OrganizationId, now: DateTime<Utc>) {
        self.organization_id = Some(organization_id);
        self.updated_at = now;
    }

    pub fn replace_password_hash(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }

    pub fn set_admin(&mut self, admin: bool, now: DateTime<Utc>) {
        self.admin = admin;
        self.updated_at = now;
    }

    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.updated_at = now;
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
