//! The caller on whose behalf access is resolved.

use crate::domain::foundation::UserId;

/// Caller identity as established by the (external) auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Member(UserId),
    Admin(UserId),
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    /// Authenticated user id, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::Member(id) | Actor::Admin(id) => Some(id),
        }
    }
}
