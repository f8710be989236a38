//! Authorization rules for destructive actions.
//!
//! All delete handlers funnel through [`can_moderate`] so that the
//! authentication and ownership rules are applied uniformly.

/// Role attached to an authenticated account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Destructive action to authorize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    DeleteTrick,
    DeleteComment,
    DeleteVideo,
    DeleteUser,
}

/// An authenticated actor. Anonymous requests are represented by the absence
/// of a principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

/// Decide whether `principal` may perform `action` on a resource owned by
/// `owner`.
///
/// Anonymous callers are always denied. Deleting a user account is reserved
/// for administrators; owning the account does not help. Every other action is
/// permitted to administrators and to the resource owner. Callers must resolve
/// resource existence beforehand; a missing resource is "not found", never
/// "not authorized".
pub fn can_moderate(principal: Option<&Principal>, owner: &str, action: Action) -> bool {
    let Some(principal) = principal else {
        return false;
    };

    match action {
        Action::DeleteUser => principal.role == Role::Admin,
        Action::DeleteTrick | Action::DeleteComment | Action::DeleteVideo => {
            principal.role == Role::Admin || principal.username == owner
        }
    }
}
