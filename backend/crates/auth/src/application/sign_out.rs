//! Sign Out Use Case
//!
//! Revokes the provider session, drops the backend session and tells the
//! device's observers.

use std::sync::Arc;

use platform::crypto::SigningKey;

use crate::application::check_session::parse_session_token;
use crate::application::session_events::{AuthEventKind, SessionBroadcast};
use crate::domain::repository::{AuthGateway, SessionStore};
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S, G>
where
    S: SessionStore,
    G: AuthGateway,
{
    repo: Arc<S>,
    gateway: Arc<G>,
    key: SigningKey,
    events: SessionBroadcast,
}

impl<S, G> SignOutUseCase<S, G>
where
    S: SessionStore,
    G: AuthGateway,
{
    pub fn new(repo: Arc<S>, gateway: Arc<G>, key: SigningKey, events: SessionBroadcast) -> Self {
        Self {
            repo,
            gateway,
            key,
            events,
        }
    }

    /// Idempotent: a missing or forged cookie still signs the device out
    pub async fn execute(&self, session_token: Option<&str>, device_key: &str) -> AuthResult<()> {
        if let Some(session_id) = session_token.and_then(|t| parse_session_token(&self.key, t).ok())
        {
            if let Some(session) = self.repo.find_session(&session_id).await? {
                // provider revocation failing must not keep the backend session alive
                if let Err(e) = self.gateway.sign_out(&session.access_token).await {
                    tracing::warn!(error = %e, "Provider sign-out failed");
                }
                self.repo.delete_session(&session_id).await?;
                tracing::info!(
                    user_id = %session.user_id,
                    session_id = %session_id,
                    "User signed out"
                );
            }
        }

        self.events.publish(AuthEventKind::SignedOut, device_key);
        Ok(())
    }
}
