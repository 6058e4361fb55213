use identity_core::Actor;

/// The resolved caller of the current request.
///
/// Inserted by the auth middleware and present for every protected route.
/// Never outlives the request it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}
