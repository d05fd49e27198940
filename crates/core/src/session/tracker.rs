//! Session Tracker

use tokio::sync::watch;
use tracing::debug;

use crate::session::{Identity, IdentityError, IdentityProvider, UserUuid};

/// Change of signed-in user observed by a [`SessionTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTransition {
    /// Identity before the change.
    pub previous: Option<Identity>,

    /// Identity after the change.
    pub current: Option<Identity>,
}

impl SessionTransition {
    /// A user signed out and nobody is signed in now.
    pub fn is_sign_out(&self) -> bool {
        self.previous.is_some() && self.current.is_none()
    }

    /// Somebody signed in and nobody was signed in before. Switching straight
    /// from one user to another is neither a sign-in nor a sign-out.
    pub fn is_sign_in(&self) -> bool {
        self.previous.is_none() && self.current.is_some()
    }
}

/// Follows the identity provider and reports every change of signed-in user.
///
/// Dropping the tracker drops its subscription.
#[derive(Debug)]
pub struct SessionTracker {
    changes: watch::Receiver<Option<Identity>>,
    current: Option<Identity>,
}

impl SessionTracker {
    /// Subscribe to the provider and resolve the existing session.
    ///
    /// The subscription is taken before the session is resolved, so a change
    /// racing with start-up is still reported by [`Self::next_transition`].
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot resolve the current session.
    pub async fn start(provider: &dyn IdentityProvider) -> Result<Self, IdentityError> {
        let changes = provider.session_changes();
        let current = provider.current_session().await?;

        debug!(
            signed_in = current.is_some(),
            "session tracker resolved initial session"
        );

        Ok(Self { changes, current })
    }

    /// Identity currently signed in.
    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Wait for the signed-in user to change.
    ///
    /// Notifications that keep the same user (token refreshes, repeated sign-in)
    /// are skipped. Returns `None` once the provider has gone away.
    pub async fn next_transition(&mut self) -> Option<SessionTransition> {
        loop {
            if self.changes.changed().await.is_err() {
                return None;
            }

            let next = self.changes.borrow_and_update().clone();

            if user_of(next.as_ref()) == user_of(self.current.as_ref()) {
                continue;
            }

            let previous = std::mem::replace(&mut self.current, next.clone());

            return Some(SessionTransition {
                previous,
                current: next,
            });
        }
    }
}

fn user_of(identity: Option<&Identity>) -> Option<UserUuid> {
    identity.map(|identity| identity.user_uuid)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{memory::MemoryIdentityProvider, session::UserUuid};

    use super::*;

    #[tokio::test]
    async fn start_resolves_existing_session() -> TestResult {
        let user = Identity::new(UserUuid::new());
        let provider = MemoryIdentityProvider::signed_in(user.clone());

        let tracker = SessionTracker::start(&provider).await?;

        assert_eq!(tracker.current(), Some(&user));

        Ok(())
    }

    #[tokio::test]
    async fn reports_sign_in_then_sign_out() -> TestResult {
        let provider = MemoryIdentityProvider::default();
        let mut tracker = SessionTracker::start(&provider).await?;
        let user = Identity::new(UserUuid::new());

        provider.set_session(Some(user.clone()));

        let signed_in = tracker.next_transition().await;

        assert!(signed_in.as_ref().is_some_and(SessionTransition::is_sign_in));
        assert_eq!(
            signed_in,
            Some(SessionTransition {
                previous: None,
                current: Some(user.clone()),
            })
        );

        provider.set_session(None);

        let signed_out = tracker.next_transition().await;

        assert!(
            signed_out.as_ref().is_some_and(SessionTransition::is_sign_out),
            "expected sign-out, got {signed_out:?}"
        );
        assert!(tracker.current().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn repeated_notifications_for_same_user_are_skipped() -> TestResult {
        let user = Identity::new(UserUuid::new());
        let other = Identity::new(UserUuid::new());
        let provider = MemoryIdentityProvider::signed_in(user.clone());
        let mut tracker = SessionTracker::start(&provider).await?;

        provider.set_session(Some(user.clone()));
        provider.set_session(Some(other.clone()));

        let transition = tracker.next_transition().await;

        assert!(
            transition
                .as_ref()
                .is_some_and(|switch| !switch.is_sign_in() && !switch.is_sign_out()),
            "expected a user switch, got {transition:?}"
        );
        assert_eq!(
            transition.and_then(|transition| transition.current),
            Some(other)
        );

        Ok(())
    }

    #[tokio::test]
    async fn ends_when_provider_is_dropped() -> TestResult {
        let provider = MemoryIdentityProvider::default();
        let mut tracker = SessionTracker::start(&provider).await?;

        drop(provider);

        assert!(tracker.next_transition().await.is_none());

        Ok(())
    }
}
