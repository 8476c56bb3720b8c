//! Auth Middleware
//!
//! Guards for routes that need a signed-in shop owner, plus the device
//! cookie every auth route runs behind.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::principal::CurrentUser;
use platform::client::DeviceId;
use platform::clock::Clock;
use platform::cookie::{extract_cookie, set_cookie_header};
use platform::crypto::SigningKey;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::{AuthGateway, AuthStore};
use crate::presentation::handlers::AuthAppState;

/// Middleware state
pub struct AuthMiddlewareState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
    pub session_key: SigningKey,
}

impl<R> Clone for AuthMiddlewareState<R>
where
    R: AuthStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            session_key: self.session_key.clone(),
        }
    }
}

impl<R, G> From<&AuthAppState<R, G>> for AuthMiddlewareState<R>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    fn from(state: &AuthAppState<R, G>) -> Self {
        Self {
            repo: state.repo.clone(),
            config: state.config.clone(),
            clock: state.clock.clone(),
            session_key: state.session_key.clone(),
        }
    }
}

/// Middleware that attaches the caller's [`DeviceId`]
///
/// A missing or tampered `sd_device` cookie gets a fresh random id, sent
/// back on the response.
pub async fn assign_device<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    let cookie = state.config.device_cookie();
    let known = extract_cookie(req.headers(), &cookie.name)
        .and_then(|token| DeviceId::from_signed(&token, &state.session_key));

    let (device, issued) = match known {
        Some(device) => (device, false),
        None => (DeviceId::generate(), true),
    };
    req.extensions_mut().insert(device.clone());

    let mut response = next.run(req).await;
    if issued {
        tracing::debug!(device = %device, "Issued device cookie");
        if let Some(value) = set_cookie_header(&cookie, &device.sign(&state.session_key)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Middleware that requires a valid auth session
///
/// On success the request carries [`CurrentUser`] and the
/// [`AuthSession`](crate::domain::entity::auth_session::AuthSession) as
/// extensions.
pub async fn require_auth_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
{
    let token = extract_cookie(req.headers(), &state.config.session_cookie().name);

    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.session_key.clone(),
        state.clock.clone(),
    );

    let Some(session) = use_case.optional(token.as_deref()).await else {
        return Err((StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response());
    };

    let user = CurrentUser::new(session.user_id, session.email.clone());
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Middleware that checks the auth session but doesn't require it
pub async fn check_auth_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    let token = extract_cookie(req.headers(), &state.config.session_cookie().name);
    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.session_key.clone(),
        state.clock.clone(),
    );

    let session = use_case.optional(token.as_deref()).await;
    req.extensions_mut().insert(AuthStatus {
        is_authenticated: session.is_some(),
    });
    if let Some(session) = session {
        req.extensions_mut()
            .insert(CurrentUser::new(session.user_id, session.email.clone()));
        req.extensions_mut().insert(session);
    }

    next.run(req).await
}

/// Authentication status stored in request extensions
#[derive(Clone, Copy)]
pub struct AuthStatus {
    pub is_authenticated: bool,
}
