//! Resolved identity of a caller for the duration of one request.

use serde::{Deserialize, Serialize};

/// Kind of caller an [`Actor`] represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    User,
    ApiKey,
    Group,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "USER",
            ActorType::ApiKey => "API_KEY",
            ActorType::Group => "GROUP",
        }
    }
}

impl core::fmt::Display for ActorType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped caller identity.
///
/// Derived fresh from the credential on every request and never persisted.
/// Fields are private so an actor cannot be altered once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    actor_id: String,
    actor_type: ActorType,
    organization_id: String,
    has_full_access: bool,
}

impl Actor {
    pub fn new(
        actor_id: impl Into<String>,
        actor_type: ActorType,
        organization_id: impl Into<String>,
        has_full_access: bool,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_type,
            organization_id: organization_id.into(),
            has_full_access,
        }
    }

    /// An end user authenticated by a bearer token.
    pub fn user(
        actor_id: impl Into<String>,
        organization_id: impl Into<String>,
        has_full_access: bool,
    ) -> Self {
        Self::new(actor_id, ActorType::User, organization_id, has_full_access)
    }

    /// An API-key caller. API keys never carry full access.
    pub fn api_key(actor_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self::new(actor_id, ActorType::ApiKey, organization_id, false)
    }

    /// Opaque actor id; empty for actors that are not users.
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    /// Tenant the actor belongs to; empty if not assigned.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn has_full_access(&self) -> bool {
        self.has_full_access
    }
}
