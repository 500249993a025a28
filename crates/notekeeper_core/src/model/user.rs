//! User identity and per-request auth context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a registered user.
pub type UserId = Uuid;

/// A registered user able to own notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique display/login name.
    pub username: String,
}

impl User {
    /// Creates a user with a freshly generated id.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username)
    }

    /// Creates a user with a caller-provided id.
    pub fn with_id(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Identity attached to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentUser {
    Anonymous,
    Identified(User),
}

impl CurrentUser {
    /// Returns the identified user, or `None` for anonymous callers.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Identified(user) => Some(user),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl From<Option<User>> for CurrentUser {
    fn from(value: Option<User>) -> Self {
        value.map_or(Self::Anonymous, Self::Identified)
    }
}

/// Supplies the current user for a request.
///
/// Credential checks live outside core; implementors only report who the
/// caller already is.
pub trait AuthContext {
    fn current_user(&self) -> CurrentUser;
}

impl AuthContext for CurrentUser {
    fn current_user(&self) -> CurrentUser {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthContext, CurrentUser, User};

    #[test]
    fn option_converts_to_current_user() {
        let user = User::new("author");
        assert_eq!(
            CurrentUser::from(Some(user.clone())),
            CurrentUser::Identified(user)
        );
        assert!(CurrentUser::from(None).is_anonymous());
    }

    #[test]
    fn current_user_is_its_own_auth_context() {
        let user = User::new("reader");
        let context = CurrentUser::Identified(user.clone());
        assert_eq!(context.current_user().user(), Some(&user));
    }
}
