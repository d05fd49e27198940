//! Identity provider backed by a hosted GoTrue-compatible auth service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use storefront::{
    Identity, IdentityProvider,
    local::LocalStore,
    session::{Credentials, IdentityError},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    auth::responses::{
        SignUpBody, StoredSession, TokenBody, UserBody, response_error, transport_error,
    },
    config::AuthConfig,
};

/// Local store key holding the signed-in session between runs.
pub const SESSION_KEY: &str = "storefront_session_v1";

pub struct HostedIdentityProvider {
    config: AuthConfig,
    http: Client,
    session: Mutex<Option<StoredSession>>,
    changes: watch::Sender<Option<Identity>>,
    persistence: Option<Arc<dyn LocalStore>>,
}

impl std::fmt::Debug for HostedIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedIdentityProvider")
            .field("auth_url", &self.config.auth_url)
            .finish_non_exhaustive()
    }
}

impl HostedIdentityProvider {
    /// Provider without a session, forgetting it when the process exits.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            session: Mutex::new(None),
            changes: watch::channel(None).0,
            persistence: None,
        }
    }

    /// Provider that restores the session saved in `store` and keeps it there.
    ///
    /// An unreadable saved session is discarded.
    #[must_use]
    pub fn persisted(config: AuthConfig, store: Arc<dyn LocalStore>) -> Self {
        let restored = match store.get_item(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<StoredSession>(&raw)
                .inspect_err(|error| warn!(%error, "discarding unreadable saved session"))
                .ok(),
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "failed to read saved session");
                None
            }
        };

        let provider = Self {
            persistence: Some(store),
            ..Self::new(config)
        };

        provider.replace_session(restored);

        provider
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<T, IdentityError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });

        let response = self
            .http
            .post(self.config.endpoint(path))
            .header("apikey", &self.config.auth_api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        parse_response(response).await
    }

    fn access_token(&self) -> Option<String> {
        self.lock_session()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    fn replace_session(&self, session: Option<StoredSession>) {
        let mut held = self.lock_session();

        self.store_session(&mut held, session);
    }

    /// Replace the held session only while it still carries `token`, so an
    /// answer for a token that was signed out meanwhile is dropped.
    fn replace_session_for(&self, token: &str, session: Option<StoredSession>) -> bool {
        let mut held = self.lock_session();

        if !held
            .as_ref()
            .is_some_and(|current| current.access_token == token)
        {
            return false;
        }

        self.store_session(&mut held, session);

        true
    }

    fn held_identity(&self) -> Option<Identity> {
        self.lock_session()
            .as_ref()
            .map(|session| session.identity.clone())
    }

    fn store_session(&self, held: &mut Option<StoredSession>, session: Option<StoredSession>) {
        if let Some(store) = &self.persistence {
            let saved = match &session {
                Some(session) => serde_json::to_string(session)
                    .map_err(|error| error.to_string())
                    .and_then(|raw| {
                        store
                            .set_item(SESSION_KEY, &raw)
                            .map_err(|error| error.to_string())
                    }),
                None => store.remove_item(SESSION_KEY).map_err(|error| error.to_string()),
            };

            if let Err(error) = saved {
                warn!(%error, "failed to save session");
            }
        }

        let identity = session.as_ref().map(|session| session.identity.clone());

        *held = session;

        self.changes.send_replace(identity);
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<StoredSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, IdentityError> {
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();

        return Err(response_error(status, &text));
    }

    response.json().await.map_err(transport_error)
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    /// Validates the held session against the service; an expired token signs
    /// the user out.
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.config.endpoint("user"))
            .header("apikey", &self.config.auth_api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if self.replace_session_for(&token, None) {
                info!("saved session expired");
            }

            return Ok(self.held_identity());
        }

        let user: UserBody = parse_response(response).await?;

        let session = StoredSession {
            access_token: token.clone(),
            identity: Identity::from(user),
        };

        self.replace_session_for(&token, Some(session));

        Ok(self.held_identity())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    #[tracing::instrument(
        name = "auth.hosted.sign_in",
        skip(self, credentials),
        fields(email = %credentials.email),
        err
    )]
    async fn sign_in(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
        let token: TokenBody = self
            .post_json("token?grant_type=password", &credentials)
            .await?;

        let session = StoredSession::from(token);
        let identity = session.identity.clone();

        self.replace_session(Some(session));

        info!(user_uuid = %identity.user_uuid, "signed in");

        Ok(identity)
    }

    #[tracing::instrument(
        name = "auth.hosted.sign_up",
        skip(self, credentials),
        fields(email = %credentials.email),
        err
    )]
    async fn sign_up(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
        let body: SignUpBody = self.post_json("signup", &credentials).await?;

        let session = body.into_session()?;
        let identity = session.identity.clone();

        self.replace_session(Some(session));

        info!(user_uuid = %identity.user_uuid, "signed up");

        Ok(identity)
    }

    /// Always forgets the local session, even when the service cannot be
    /// reached.
    #[tracing::instrument(name = "auth.hosted.sign_out", skip(self), err)]
    async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };

        self.replace_session(None);

        let response = self
            .http
            .post(self.config.endpoint("logout"))
            .header("apikey", &self.config.auth_api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();

        Err(response_error(status, &text))
    }
}

#[cfg(test)]
mod tests {
    use storefront::{UserUuid, memory::MemoryLocalStore};
    use testresult::TestResult;

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            auth_url: "http://127.0.0.1:9".to_string(),
            auth_api_key: "public".to_string(),
        }
    }

    fn saved(identity: &Identity) -> TestResult<String> {
        Ok(serde_json::to_string(&StoredSession {
            access_token: "jwt".to_string(),
            identity: identity.clone(),
        })?)
    }

    #[tokio::test]
    async fn new_provider_has_no_session() -> TestResult {
        let provider = HostedIdentityProvider::new(config());

        assert_eq!(provider.current_session().await?, None);
        assert_eq!(*provider.session_changes().borrow(), None);

        Ok(())
    }

    #[test]
    fn persisted_provider_restores_the_saved_session() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());
        let identity = Identity::new(UserUuid::new());

        store.set_item(SESSION_KEY, &saved(&identity)?)?;

        let provider = HostedIdentityProvider::persisted(config(), store);

        assert_eq!(*provider.session_changes().borrow(), Some(identity));
        assert_eq!(provider.access_token().as_deref(), Some("jwt"));

        Ok(())
    }

    #[test]
    fn unreadable_saved_session_is_discarded() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());

        store.set_item(SESSION_KEY, "{not json")?;

        let provider = HostedIdentityProvider::persisted(config(), store.clone());

        assert_eq!(*provider.session_changes().borrow(), None);
        assert_eq!(store.get_item(SESSION_KEY)?, None);

        Ok(())
    }

    #[tokio::test]
    async fn sign_out_forgets_the_session_when_the_service_is_unreachable() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());
        let identity = Identity::new(UserUuid::new());

        store.set_item(SESSION_KEY, &saved(&identity)?)?;

        let provider = HostedIdentityProvider::persisted(config(), store.clone());
        let mut changes = provider.session_changes();

        let result = provider.sign_out().await;

        assert!(
            matches!(result, Err(IdentityError::Provider(_))),
            "expected a provider error, got {result:?}"
        );
        assert!(changes.has_changed()?);
        assert_eq!(*changes.borrow_and_update(), None);
        assert_eq!(store.get_item(SESSION_KEY)?, None);

        Ok(())
    }

    #[tokio::test]
    async fn user_lookup_finishing_after_sign_out_is_dropped() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());
        let identity = Identity::new(UserUuid::new());

        store.set_item(SESSION_KEY, &saved(&identity)?)?;

        let provider = HostedIdentityProvider::persisted(config(), store.clone());

        let _ = provider.sign_out().await;

        let replaced = provider.replace_session_for(
            "jwt",
            Some(StoredSession {
                access_token: "jwt".to_string(),
                identity,
            }),
        );

        assert!(!replaced);
        assert_eq!(provider.held_identity(), None);
        assert_eq!(*provider.session_changes().borrow(), None);
        assert_eq!(store.get_item(SESSION_KEY)?, None);

        Ok(())
    }

    #[test]
    fn user_lookup_for_the_held_token_refreshes_the_identity() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());
        let identity = Identity::new(UserUuid::new());

        store.set_item(SESSION_KEY, &saved(&identity)?)?;

        let provider = HostedIdentityProvider::persisted(config(), store);
        let refreshed = Identity {
            email: Some("ada@example.com".to_string()),
            ..identity
        };

        let replaced = provider.replace_session_for(
            "jwt",
            Some(StoredSession {
                access_token: "jwt".to_string(),
                identity: refreshed.clone(),
            }),
        );

        assert!(replaced);
        assert_eq!(provider.held_identity(), Some(refreshed));

        Ok(())
    }

    #[tokio::test]
    async fn sign_out_without_a_session_is_a_no_op() -> TestResult {
        let provider = HostedIdentityProvider::new(config());

        provider.sign_out().await?;

        Ok(())
    }
}
