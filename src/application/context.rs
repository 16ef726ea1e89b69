use crate::domain::{ProviderId, UserId};

/// The authenticated party behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(UserId),
    /// Category and assignments are read from storage on every request
    Provider(ProviderId),
    Admin,
}

impl Actor {
    pub fn role(&self) -> &'static str {
        match self {
            Actor::User(_) => "user",
            Actor::Provider(_) => "provider",
            Actor::Admin => "admin",
        }
    }
}

/// Per-request context handed to every service operation. Obtained from one
/// of the login operations, or built directly by a trusted caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    actor: Option<Actor>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn user(id: UserId) -> Self {
        Self {
            actor: Some(Actor::User(id)),
        }
    }

    pub fn provider(id: ProviderId) -> Self {
        Self {
            actor: Some(Actor::Provider(id)),
        }
    }

    pub fn admin() -> Self {
        Self {
            actor: Some(Actor::Admin),
        }
    }

    pub fn actor(&self) -> Option<Actor> {
        self.actor
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor.is_some()
    }
}
