//! Persisted organization (tenant).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Entity, OrganizationId, UserId};

/// An organization.
///
/// `name` is globally unique among non-deleted organizations (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub creator_id: UserId,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, creator_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            creator_id,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Soft-delete. The name becomes available to new sign-ups.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.updated_at = now;
    }
}

impl Entity for Organization {
    type Id = OrganizationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
