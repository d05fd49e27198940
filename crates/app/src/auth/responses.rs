//! Auth service response bodies and their mapping onto identity results.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use storefront::{Identity, UserUuid, session::IdentityError};
use tracing::info;
use uuid::Uuid;

/// Signed-in session as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub access_token: String,
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserBody {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserBody> for Identity {
    fn from(user: UserBody) -> Self {
        Self {
            user_uuid: UserUuid::from_uuid(user.id),
            email: user.email.filter(|email| !email.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    pub access_token: String,
    pub user: UserBody,
}

impl From<TokenBody> for StoredSession {
    fn from(token: TokenBody) -> Self {
        Self {
            access_token: token.access_token,
            identity: token.user.into(),
        }
    }
}

/// Sign-up answers with a session when accounts are confirmed automatically
/// and with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpBody {
    Session(TokenBody),
    User(UserBody),
}

impl SignUpBody {
    pub(crate) fn into_session(self) -> Result<StoredSession, IdentityError> {
        match self {
            Self::Session(token) => Ok(token.into()),
            Self::User(user) => {
                info!(user_uuid = %user.id, "sign-up awaiting email confirmation");

                Err(IdentityError::ConfirmationRequired)
            }
        }
    }
}

/// Error body. Older deployments send `error`/`error_description`, newer ones
/// `error_code`/`msg`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// Map a failed auth response onto an [`IdentityError`].
pub(crate) fn response_error(status: StatusCode, body: &str) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    match parsed.code() {
        Some("invalid_grant" | "invalid_credentials") => IdentityError::InvalidCredentials,
        Some("email_not_confirmed") => IdentityError::ConfirmationRequired,
        _ => IdentityError::Provider(format!(
            "auth request failed with status {status}: {}",
            parsed.message().unwrap_or(body)
        )),
    }
}

pub(crate) fn transport_error(error: reqwest::Error) -> IdentityError {
    IdentityError::Provider(format!("auth request failed: {error}"))
}
