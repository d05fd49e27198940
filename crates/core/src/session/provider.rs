//! Identity Provider

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::sync::watch;

use crate::session::{Credentials, Identity};

/// Errors raised by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email or password was rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Sign-up succeeded but the account must be confirmed before signing in.
    #[error("account requires confirmation")]
    ConfirmationRequired,

    /// The provider failed or answered unexpectedly.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Hosted authentication service.
///
/// Session changes are published on a [`watch`] channel; dropping the receiver
/// unsubscribes.
#[automock]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the current session, if any.
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError>;

    /// Subscribe to live session changes.
    fn session_changes(&self) -> watch::Receiver<Option<Identity>>;

    /// Sign in with email and password.
    async fn sign_in(&self, credentials: Credentials) -> Result<Identity, IdentityError>;

    /// Create a new account and sign it in.
    async fn sign_up(&self, credentials: Credentials) -> Result<Identity, IdentityError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}
