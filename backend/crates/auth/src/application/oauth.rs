//! OAuth Use Case
//!
//! PKCE code flow against the auth provider. The verifier is kept in a
//! short-lived HttpOnly cookie between the redirect and the callback.

use std::sync::Arc;

use platform::clock::Clock;
use platform::crypto::{random_bytes, sha256, to_base64};

use crate::application::check_session::SessionIssuer;
use crate::application::config::AuthConfig;
use crate::application::session_events::{AuthEventKind, SessionBroadcast};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::onboarding::PostAuthRoute;
use crate::domain::repository::{AuthGateway, AuthStore, ProfileStore};
use crate::domain::value_object::oauth_provider::OAuthProvider;

/// PKCE verifier and its S256 challenge
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = to_base64(&random_bytes(32));
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    pub fn challenge_for(verifier: &str) -> String {
        to_base64(&sha256(verifier.as_bytes()))
    }
}

pub struct OAuthStart {
    pub authorize_url: String,
    pub verifier: String,
}

#[derive(Debug)]
pub struct OAuthCallbackOutput {
    pub route: PostAuthRoute,
    /// Session and cookie value when the exchange succeeded
    pub session: Option<(AuthSession, String)>,
}

impl OAuthCallbackOutput {
    fn login() -> Self {
        Self {
            route: PostAuthRoute::Login,
            session: None,
        }
    }
}

/// OAuth use case
pub struct OAuthUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    config: Arc<AuthConfig>,
    sessions: SessionIssuer<R>,
    events: SessionBroadcast,
}

impl<R, G> OAuthUseCase<R, G>
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
    ) -> Self {
        Self {
            sessions: SessionIssuer::new(repo.clone(), config.clone(), key, clock),
            repo,
            gateway,
            config,
            events,
        }
    }

    pub fn start(&self, provider: OAuthProvider) -> OAuthStart {
        let pkce = Pkce::generate();
        let authorize_url =
            self.gateway
                .authorize_url(provider, &self.config.callback_url(), &pkce.challenge);
        tracing::debug!(%provider, "OAuth redirect issued");
        OAuthStart {
            authorize_url,
            verifier: pkce.verifier,
        }
    }

    /// Missing code or a failed exchange lands on login
    pub async fn callback(
        &self,
        code: Option<&str>,
        verifier: Option<&str>,
        device_key: &str,
    ) -> OAuthCallbackOutput {
        let (Some(code), Some(verifier)) = (code.filter(|c| !c.is_empty()), verifier) else {
            tracing::debug!("OAuth callback without code or verifier");
            return OAuthCallbackOutput::login();
        };

        let provider = match self.gateway.exchange_code(code, verifier).await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!(error = %e, "OAuth code exchange failed");
                return OAuthCallbackOutput::login();
            }
        };

        let (session, token) = match self.sessions.issue(provider).await {
            Ok(issued) => issued,
            Err(e) => {
                tracing::error!(error = %e, "Storing OAuth session failed");
                return OAuthCallbackOutput::login();
            }
        };

        // a failed lookup is treated as "no profile yet"
        let profile = self
            .repo
            .find_profile(&session.user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, user_id = %session.user_id, "Profile fetch after OAuth failed");
                None
            });
        let route = PostAuthRoute::for_profile(profile.as_ref());

        self.events.publish(AuthEventKind::SignedIn, device_key);
        tracing::info!(user_id = %session.user_id, route = route.path(), "OAuth sign-in");

        OAuthCallbackOutput {
            route,
            session: Some((session, token)),
        }
    }
}
