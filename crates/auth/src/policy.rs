//! Access policy: pure decisions over a resolved [`Actor`].
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use identity_core::{Actor, ActorType, IdentityError, IdentityResult, OrganizationId, UserId};

/// What an operation requires of its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    /// A resolved `USER` actor acting on itself.
    SelfUser,
    /// Any resolved actor, always scoped to its own organization.
    Member,
    /// An actor holding the full-access flag.
    FullAccess,
}

/// Operations guarded by the policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    GetSelf,
    ChangeOwnPassword,
    GetOrganization,
    ListUsers,
    GetUser,
    AddUser,
    DeleteUser,
    ResetPassword,
    ChangeAdmin,
}

impl Operation {
    pub fn required_access(&self) -> Access {
        match self {
            Operation::GetSelf | Operation::ChangeOwnPassword => Access::SelfUser,
            Operation::GetOrganization | Operation::ListUsers | Operation::GetUser => {
                Access::Member
            }
            Operation::AddUser
            | Operation::DeleteUser
            | Operation::ResetPassword
            | Operation::ChangeAdmin => Access::FullAccess,
        }
    }
}

/// True iff the actor is of the given type.
pub fn require_actor_type(actor: &Actor, actor_type: ActorType) -> bool {
    actor.actor_type() == actor_type
}

/// True iff the actor holds the full-access flag.
pub fn require_full_access(actor: &Actor) -> bool {
    actor.has_full_access()
}

/// The organization every tenant-scoped lookup must filter by.
///
/// An actor without an organization cannot see any tenant data.
pub fn scope_to_organization(actor: &Actor) -> IdentityResult<OrganizationId> {
    if actor.organization_id().is_empty() {
        return Err(IdentityError::Forbidden);
    }
    actor
        .organization_id()
        .parse()
        .map_err(|_| IdentityError::Forbidden)
}

/// The caller's own user id, for "self" operations.
pub fn self_user_id(actor: &Actor) -> IdentityResult<UserId> {
    if !require_actor_type(actor, ActorType::User) {
        return Err(IdentityError::Forbidden);
    }
    actor.actor_id().parse().map_err(|_| IdentityError::Forbidden)
}

/// Authorize an actor for an operation.
pub fn authorize(actor: &Actor, operation: Operation) -> IdentityResult<()> {
    let allowed = match operation.required_access() {
        Access::SelfUser => require_actor_type(actor, ActorType::User),
        Access::Member => true,
        Access::FullAccess => require_full_access(actor),
    };

    if allowed {
        Ok(())
    } else {
        tracing::info!(
            actor_type = %actor.actor_type(),
            operation = ?operation,
            "operation denied by policy"
        );
        Err(IdentityError::Forbidden)
    }
}
