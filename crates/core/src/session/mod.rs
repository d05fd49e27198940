//! Sessions

use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

mod provider;
mod tracker;

pub use provider::*;
pub use tracker::*;

/// User UUID, as assigned by the identity provider.
pub type UserUuid = TypedUuid<Identity>;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user identifier.
    pub user_uuid: UserUuid,

    /// Email address the user signed in with, when the provider exposes it.
    pub email: Option<String>,
}

impl Identity {
    /// Identity without an email address.
    #[must_use]
    pub fn new(user_uuid: UserUuid) -> Self {
        Self {
            user_uuid,
            email: None,
        }
    }
}

/// Email and password pair used to sign in or sign up.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email.
    pub email: String,

    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
