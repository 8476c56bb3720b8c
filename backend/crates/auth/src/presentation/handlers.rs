//! HTTP Handlers

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Redirect};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};

use platform::client::{ClientFingerprint, DeviceId, extract_fingerprint};
use platform::clock::Clock;
use platform::cookie::{CookieConfig, delete_cookie_header, extract_cookie, set_cookie_header};
use platform::crypto::SigningKey;
use platform::password::PasswordStrength;

use crate::application::config::AuthConfig;
use crate::application::in_flight::InFlight;
use crate::application::sign_up::{CredentialsInput, PersonalInput, ShopInput};
use crate::application::{
    CheckSessionUseCase, LockoutTracker, OAuthUseCase, OnboardingForm, OnboardingUseCase,
    SessionBroadcast, SignInInput, SignInUseCase, SignOutUseCase, SignUpUseCase, SignupFlow,
    SignupFlows, SignupView,
};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::{AuthGateway, AuthStore, SessionStore};
use crate::domain::value_object::{oauth_provider::OAuthProvider, user_name::Username};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CompletedResponse, FinalizeRequest, LoginRequest, LoginResponse, OAuthCallbackQuery,
    OnboardingRequest, PasswordStrengthRequest, PersonalRequest, SendOtpRequest,
    SignupStartRequest, UsernamePreviewQuery, UsernamePreviewResponse, VerifyOtpRequest,
};
use kernel::id::SignupFlowId;

/// Shared state for auth handlers
pub struct AuthAppState<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub gateway: Arc<G>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
    pub flows: SignupFlows,
    pub events: SessionBroadcast,
    pub in_flight: InFlight,
    pub session_key: SigningKey,
}

impl<R, G> Clone for AuthAppState<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            flows: self.flows.clone(),
            events: self.events.clone(),
            in_flight: self.in_flight.clone(),
            session_key: self.session_key.clone(),
        }
    }
}

impl<R, G> AuthAppState<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    pub fn new(repo: R, gateway: G, config: AuthConfig, clock: Arc<dyn Clock>) -> AuthResult<Self> {
        let session_key = SigningKey::new(&config.session_secret)
            .map_err(|e| AuthError::Internal(format!("Invalid session secret: {e}")))?;
        Ok(Self {
            repo: Arc::new(repo),
            gateway: Arc::new(gateway),
            config: Arc::new(config),
            clock,
            flows: SignupFlows::new(),
            events: SessionBroadcast::new(),
            in_flight: InFlight::new(),
            session_key,
        })
    }

    /// Periodically drop expired sessions and idle signup flows
    pub fn spawn_housekeeping(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let now_ms = state.clock.now_ms();
                if let Err(e) = state.repo.purge_expired_sessions(now_ms).await {
                    tracing::warn!(error = %e, "Session cleanup failed");
                }
                let ttl_ms = i64::try_from(state.config.flow_ttl.as_millis()).unwrap_or(i64::MAX);
                let purged = state.flows.purge_idle(now_ms, ttl_ms).await;
                if purged > 0 {
                    tracing::debug!(purged, "Idle signup flows dropped");
                }
            }
        })
    }

    fn check_session(&self) -> CheckSessionUseCase<R> {
        CheckSessionUseCase::new(self.repo.clone(), self.session_key.clone(), self.clock.clone())
    }

    fn sign_up(&self) -> SignUpUseCase<R, G> {
        SignUpUseCase::new(
            self.repo.clone(),
            self.gateway.clone(),
            self.config.clone(),
            self.clock.clone(),
            self.session_key.clone(),
            self.events.clone(),
        )
    }

    fn lockout(&self) -> LockoutTracker<R> {
        LockoutTracker::new(self.repo.clone(), self.config.lockout, self.clock.clone())
    }

    /// Session for the request cookie, if any
    async fn current_session(&self, headers: &HeaderMap) -> Option<AuthSession> {
        let token = extract_cookie(headers, &self.config.session_cookie().name);
        self.check_session().optional(token.as_deref()).await
    }

    fn flow_id(&self, headers: &HeaderMap) -> AuthResult<SignupFlowId> {
        let cookie = extract_cookie(headers, &self.config.flow_cookie().name)
            .ok_or(AuthError::FlowNotFound)?;
        let payload = self
            .session_key
            .verify(&cookie)
            .ok_or(AuthError::FlowNotFound)?;
        payload.parse().map_err(|_| AuthError::FlowNotFound)
    }
}

fn fingerprint(headers: &HeaderMap, device: DeviceId) -> AuthResult<ClientFingerprint> {
    Ok(extract_fingerprint(headers, device)?)
}

fn set_cookie(headers: &mut HeaderMap, config: &CookieConfig, value: &str) {
    if let Some(v) = set_cookie_header(config, value) {
        headers.append(header::SET_COOKIE, v);
    }
}

fn clear_cookie(headers: &mut HeaderMap, config: &CookieConfig) {
    if let Some(v) = delete_cookie_header(config) {
        headers.append(header::SET_COOKIE, v);
    }
}

type TickStream = Pin<Box<dyn Stream<Item = u64> + Send>>;

fn countdown_events(ticks: TickStream, name: &'static str) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ticks.map(move |secs| Ok(Event::default().event(name).data(secs.to_string())));
    Sse::new(events).keep_alive(KeepAlive::default())
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.gateway.clone(),
        state.config.clone(),
        state.clock.clone(),
        state.session_key.clone(),
        state.events.clone(),
        state.in_flight.clone(),
    );

    let input = SignInInput {
        username: req.username,
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input, &fingerprint).await?;

    let mut response_headers = HeaderMap::new();
    set_cookie(
        &mut response_headers,
        &state.config.session_cookie(),
        &output.session_token,
    );

    Ok((
        response_headers,
        Json(LoginResponse {
            route: output.route,
            redirect_to: output.route.path(),
            email: output.session.email,
        }),
    ))
}

/// GET /api/auth/login/lockout
pub async fn lockout_status<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;
    let status = state.lockout().status(&fingerprint.device_key()).await?;
    Ok(Json(status))
}

/// GET /api/auth/login/lockout/stream
///
/// `lockout` events with the seconds left, ending with 0.
pub async fn lockout_stream<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;
    let ticks: TickStream = match state.lockout().countdown(&fingerprint.device_key()).await? {
        Some(countdown) => Box::pin(countdown.into_stream()),
        None => Box::pin(tokio_stream::once(0)),
    };
    Ok(countdown_events(ticks, "lockout"))
}

/// POST /api/auth/logout
pub async fn logout<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;
    let token = extract_cookie(&headers, &state.config.session_cookie().name);

    let use_case = SignOutUseCase::new(
        state.repo.clone(),
        state.gateway.clone(),
        state.session_key.clone(),
        state.events.clone(),
    );
    use_case
        .execute(token.as_deref(), &fingerprint.device_key())
        .await?;

    let mut response_headers = HeaderMap::new();
    clear_cookie(&mut response_headers, &state.config.session_cookie());
    Ok((StatusCode::NO_CONTENT, response_headers))
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/session
pub async fn session<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let token = extract_cookie(&headers, &state.config.session_cookie().name);
    Json(state.check_session().nav_state(token.as_deref()).await)
}

/// GET /api/auth/events
///
/// `signed-in` / `signed-out` nudges for this device; clients refetch
/// `/session` on each.
pub async fn events<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;
    let stream = state
        .events
        .stream_for(fingerprint.device_key())
        .map(|kind| Event::default().event("auth").json_data(kind));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ============================================================================
// Signup
// ============================================================================

/// POST /api/auth/signup/start
pub async fn signup_start<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<SignupStartRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let now_ms = state.clock.now_ms();

    let flow = if req.from_oauth {
        let session = state
            .current_session(&headers)
            .await
            .ok_or(AuthError::SessionInvalid)?;
        SignupFlow::from_identity(session.email, session.display_name, now_ms)
    } else {
        SignupFlow::new(now_ms)
    };
    let view = flow.view();
    let id = state.flows.insert(flow).await;
    tracing::debug!(flow_id = %id, from_oauth = req.from_oauth, "Signup flow started");

    let mut response_headers = HeaderMap::new();
    set_cookie(
        &mut response_headers,
        &state.config.flow_cookie(),
        &state.session_key.sign(&id.to_string()),
    );
    Ok((response_headers, Json(view)))
}

/// GET /api/auth/signup
pub async fn signup_view<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> AuthResult<Json<SignupView>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let flow = state.flows.read(&id).await?;
    Ok(Json(flow.view()))
}

/// POST /api/auth/signup/send-otp
pub async fn signup_send_otp<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<SendOtpRequest>,
) -> AuthResult<Json<SignupView>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;

    let input = CredentialsInput {
        email: req.email,
        password: req.password,
        confirm: req.confirm,
        full_name: req.full_name,
        store_name: req.store_name,
    };
    state.sign_up().send_otp(&mut flow, input).await?;
    Ok(Json(flow.view()))
}

/// POST /api/auth/signup/resend-otp
pub async fn signup_resend_otp<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> AuthResult<Json<SignupView>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;
    state.sign_up().resend_otp(&mut flow).await?;
    Ok(Json(flow.view()))
}

/// GET /api/auth/signup/resend/stream
///
/// `resend` events with the cooldown seconds left, ending with 0.
pub async fn signup_resend_stream<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let flow = state.flows.read(&id).await?;
    let ticks: TickStream = match flow.resend_countdown() {
        Some(rx) => Box::pin(WatchStream::new(rx)),
        None => Box::pin(tokio_stream::once(0)),
    };
    Ok(countdown_events(ticks, "resend"))
}

/// POST /api/auth/signup/verify-otp
pub async fn signup_verify_otp<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
    Json(req): Json<VerifyOtpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let fingerprint = fingerprint(&headers, device)?;
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;

    let output = state
        .sign_up()
        .verify_otp(&mut flow, req.otp, &fingerprint.device_key())
        .await?;

    let mut response_headers = HeaderMap::new();
    set_cookie(
        &mut response_headers,
        &state.config.session_cookie(),
        &output.session_token,
    );
    Ok((response_headers, Json(flow.view())))
}

/// POST /api/auth/signup/personal
pub async fn signup_personal<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<PersonalRequest>,
) -> AuthResult<Json<SignupView>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;

    let input = PersonalInput {
        full_name: req.full_name,
        birth_date: req.birth_date,
        phone: req.phone,
    };
    state.sign_up().go_step4(&mut flow, input)?;
    Ok(Json(flow.view()))
}

/// POST /api/auth/signup/finalize
pub async fn signup_finalize<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<FinalizeRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;
    let user_id = state.current_session(&headers).await.map(|s| s.user_id);

    let input = ShopInput {
        shop_type: req.shop_type,
        store_name: req.store_name,
        source: req.source,
        promo_code: req.promo_code,
    };
    let output = state.sign_up().finalize(&mut flow, input, user_id).await?;
    drop(flow);
    state.flows.remove(&id).await;

    let mut response_headers = HeaderMap::new();
    clear_cookie(&mut response_headers, &state.config.flow_cookie());
    Ok((
        response_headers,
        Json(CompletedResponse {
            username: output.username.to_string(),
            redirect_to: output.route.path(),
        }),
    ))
}

/// POST /api/auth/signup/back
pub async fn signup_back<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> AuthResult<Json<SignupView>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let id = state.flow_id(&headers)?;
    let mut flow = state.flows.acquire(&id).await?;
    flow.back()?;
    Ok(Json(flow.view()))
}

// ============================================================================
// OAuth
// ============================================================================

fn oauth<R, G>(state: &AuthAppState<R, G>) -> OAuthUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    OAuthUseCase::new(
        state.repo.clone(),
        state.gateway.clone(),
        state.config.clone(),
        state.clock.clone(),
        state.session_key.clone(),
        state.events.clone(),
    )
}

/// GET /api/auth/oauth/{provider}
pub async fn oauth_start<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Path(provider): Path<String>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let provider = provider
        .parse::<OAuthProvider>()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let start = oauth(&state).start(provider);

    let mut response_headers = HeaderMap::new();
    set_cookie(
        &mut response_headers,
        &state.config.verifier_cookie(),
        &start.verifier,
    );
    Ok((response_headers, Redirect::to(&start.authorize_url)))
}

/// GET /api/auth/callback
pub async fn oauth_callback<R, G>(
    State(state): State<AuthAppState<R, G>>,
    Extension(device): Extension<DeviceId>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> impl IntoResponse
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    if let Some(error) = &query.error {
        tracing::info!(error = %error, "OAuth cancelled at provider");
    }
    let verifier = extract_cookie(&headers, &state.config.verifier_cookie().name);
    let device_key = device.as_str().to_string();

    let output = oauth(&state)
        .callback(query.code.as_deref(), verifier.as_deref(), &device_key)
        .await;

    let mut response_headers = HeaderMap::new();
    clear_cookie(&mut response_headers, &state.config.verifier_cookie());
    if let Some((_, token)) = &output.session {
        set_cookie(&mut response_headers, &state.config.session_cookie(), token);
    }
    let target = format!("{}{}", state.config.public_origin, output.route.path());
    (response_headers, Redirect::to(&target))
}

// ============================================================================
// Onboarding
// ============================================================================

/// GET /api/auth/onboarding
pub async fn onboarding_check<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let session = state.current_session(&headers).await;
    let use_case = OnboardingUseCase::new(state.repo.clone(), state.clock.clone());
    Json(use_case.check(session.as_ref()).await)
}

/// POST /api/auth/onboarding
pub async fn onboarding_submit<R, G>(
    State(state): State<AuthAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<OnboardingRequest>,
) -> AuthResult<Json<CompletedResponse>>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let user_id = state.current_session(&headers).await.map(|s| s.user_id);
    let use_case = OnboardingUseCase::new(state.repo.clone(), state.clock.clone());

    let form = OnboardingForm {
        full_name: req.full_name,
        birth_date: req.birth_date,
        phone: req.phone,
        shop_type: req.shop_type,
        shop_name: req.shop_name,
        source: req.source,
        promo_code: req.promo_code,
    };
    let output = use_case.submit(user_id, form).await?;

    Ok(Json(CompletedResponse {
        username: output.username.to_string(),
        redirect_to: output.route.path(),
    }))
}

// ============================================================================
// Live hints
// ============================================================================

/// GET /api/auth/username-preview
pub async fn username_preview(Query(query): Query<UsernamePreviewQuery>) -> impl IntoResponse {
    let username = Username::derive(&query.full_name, &query.store_name, &query.birth_date);
    Json(UsernamePreviewResponse {
        username: username.to_string(),
    })
}

/// POST /api/auth/password-strength
pub async fn password_strength(Json(req): Json<PasswordStrengthRequest>) -> impl IntoResponse {
    Json(PasswordStrength::of(&req.password))
}
