//! Check Session Use Case
//!
//! Resolves the signed session cookie to a live [`AuthSession`], and issues
//! new sessions from provider tokens.

use std::sync::Arc;

use platform::clock::Clock;
use platform::crypto::SigningKey;

use crate::application::config::AuthConfig;
use crate::application::session_events::NavState;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::{AuthStore, ProfileStore, ProviderSession, SessionStore};
use crate::error::{AuthError, AuthResult};
use kernel::id::SessionId;

/// Cookie value for a session: `<session id>.<hmac>`
pub fn session_token(key: &SigningKey, session: &AuthSession) -> String {
    key.sign(&session.session_id.to_string())
}

/// Verify the signature and parse the id
pub fn parse_session_token(key: &SigningKey, token: &str) -> AuthResult<SessionId> {
    let payload = key.verify(token).ok_or(AuthError::SessionInvalid)?;
    payload.parse().map_err(|_| AuthError::SessionInvalid)
}

/// Check session use case
pub struct CheckSessionUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl<R> CheckSessionUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        Self { repo, key, clock }
    }

    /// Live session for the cookie value; expired sessions are deleted
    pub async fn execute(&self, session_token: &str) -> AuthResult<AuthSession> {
        let session_id = parse_session_token(&self.key, session_token)?;

        let session = self
            .repo
            .find_session(&session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired(self.clock.now_ms()) {
            self.repo.delete_session(&session_id).await?;
            tracing::debug!(session_id = %session_id, "Expired session removed");
            return Err(AuthError::SessionInvalid);
        }

        Ok(session)
    }

    /// Session if the cookie is present and valid; anything else is "signed out"
    pub async fn optional(&self, session_token: Option<&str>) -> Option<AuthSession> {
        match session_token {
            Some(token) => self.execute(token).await.ok(),
            None => None,
        }
    }

    /// Nav bar state; profile lookup errors fall back to defaults
    pub async fn nav_state(&self, session_token: Option<&str>) -> NavState {
        let Some(session) = self.optional(session_token).await else {
            return NavState::signed_out();
        };
        let profile = match self.repo.find_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %session.user_id, "Profile lookup for nav failed");
                None
            }
        };
        NavState::derive(Some(&session), profile.as_ref())
    }
}

/// Persists a backend session for freshly issued provider tokens
pub struct SessionIssuer<S>
where
    S: SessionStore,
{
    repo: Arc<S>,
    config: Arc<AuthConfig>,
    key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl<S> SessionIssuer<S>
where
    S: SessionStore,
{
    pub fn new(repo: Arc<S>, config: Arc<AuthConfig>, key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            key,
            clock,
        }
    }

    /// Returns the session and its cookie value
    pub async fn issue(&self, provider: ProviderSession) -> AuthResult<(AuthSession, String)> {
        let session =
            AuthSession::from_provider(provider, self.clock.now(), self.config.session_ttl_ms());
        self.repo.create_session(&session).await?;

        tracing::info!(
            user_id = %session.user_id,
            session_id = %session.session_id,
            "Session created"
        );

        let token = session_token(&self.key, &session);
        Ok((session, token))
    }
}
