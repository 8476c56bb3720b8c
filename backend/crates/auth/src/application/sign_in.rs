//! Sign In Use Case
//!
//! Three-factor login: username, email and password. The provider checks
//! email and password; the username is matched against the profile.
//!
//! Order: lockout → field shape → provider sign-in → profile → username →
//! active flag. Every failure from the provider step on counts against the
//! device; a shape failure does not.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::check_session::SessionIssuer;
use crate::application::config::AuthConfig;
use crate::application::in_flight::InFlight;
use crate::application::lockout::LockoutTracker;
use crate::application::session_events::{AuthEventKind, SessionBroadcast};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::onboarding::PostAuthRoute;
use crate::domain::repository::{AuthGateway, AuthStore, ProfileStore, ProviderSession};
use crate::domain::validator::{is_valid_email, is_valid_login_password};
use crate::domain::value_object::{
    email::Email,
    user_name::{LoginHandle, Username},
    user_password::LoginPassword,
};
use crate::error::{AuthError, AuthResult};

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;

const FIELDS_INVALID: &str = "Fill in all fields correctly";

/// Sign in input
pub struct SignInInput {
    /// As typed, `@` optional
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub session: AuthSession,
    /// Session cookie value
    pub session_token: String,
    pub route: PostAuthRoute,
}

/// Sign in use case
pub struct SignInUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    lockout: LockoutTracker<R>,
    sessions: SessionIssuer<R>,
    events: SessionBroadcast,
    in_flight: InFlight,
}

impl<R, G> SignInUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
        key: platform::crypto::SigningKey,
        events: SessionBroadcast,
        in_flight: InFlight,
    ) -> Self {
        Self {
            lockout: LockoutTracker::new(repo.clone(), config.lockout, clock.clone()),
            sessions: SessionIssuer::new(repo.clone(), config, key, clock),
            repo,
            gateway,
            events,
            in_flight,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let device_key = fingerprint.device_key();
        let _guard = self
            .in_flight
            .try_acquire(&device_key)
            .ok_or(AuthError::Busy)?;

        self.lockout.ensure_open(&device_key).await?;

        if !LoginHandle::is_acceptable(&input.username)
            || !is_valid_email(input.email.trim())
            || !is_valid_login_password(&input.password)
        {
            return Err(AuthError::Validation(FIELDS_INVALID.to_string()));
        }

        match self.authenticate(&input).await {
            Ok((provider, route)) => {
                self.lockout.reset(&device_key).await?;
                let (session, session_token) = self.sessions.issue(provider).await?;
                self.events.publish(AuthEventKind::SignedIn, &device_key);

                tracing::info!(
                    user_id = %session.user_id,
                    ip = ?fingerprint.ip_string(),
                    route = route.path(),
                    "User signed in"
                );

                Ok(SignInOutput {
                    session,
                    session_token,
                    route,
                })
            }
            Err(cause) => Err(self.lockout.record_failure(&device_key, cause).await),
        }
    }

    /// Provider sign-in plus the profile checks
    async fn authenticate(
        &self,
        input: &SignInInput,
    ) -> AuthResult<(ProviderSession, PostAuthRoute)> {
        let email = Email::new(input.email.trim()).map_err(|_| AuthError::InvalidCredentials)?;
        let password = LoginPassword::new(&input.password)?;

        let provider = self
            .gateway
            .sign_in_with_password(&email, password.expose())
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Provider rejected password sign-in");
                AuthError::InvalidCredentials
            })?;

        let profile = match self.repo.find_profile(&provider.user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Err(self.reject(&provider, AuthError::ProfileNotFound).await),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %provider.user.id, "Profile fetch failed");
                return Err(self.reject(&provider, AuthError::ProfileNotFound).await);
            }
        };

        let handle = LoginHandle::new(&input.username);
        let matches = profile
            .username()
            .is_some_and(|stored: Username| stored.matches(&handle));
        if !matches {
            return Err(self.reject(&provider, AuthError::UsernameMismatch).await);
        }

        if !profile.is_active {
            return Err(self.reject(&provider, AuthError::AccountDisabled).await);
        }

        Ok((provider, PostAuthRoute::for_profile(Some(&profile))))
    }

    /// Revoke the provider session that was just opened
    async fn reject(&self, provider: &ProviderSession, cause: AuthError) -> AuthError {
        if let Err(e) = self.gateway.sign_out(&provider.access_token).await {
            tracing::warn!(error = %e, "Provider sign-out after rejected login failed");
        }
        cause
    }
}
