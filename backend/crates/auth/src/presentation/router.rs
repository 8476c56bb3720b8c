//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::domain::repository::{AuthGateway, AuthStore};
use crate::infra::{GoTrueGateway, PgAuthStore};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, assign_device};

/// Create the Auth router with PostgreSQL storage and the GoTrue gateway
pub fn auth_router(state: AuthAppState<PgAuthStore, GoTrueGateway>) -> Router {
    auth_router_generic(state)
}

/// Create a generic Auth router for any store and gateway implementation
pub fn auth_router_generic<R, G>(state: AuthAppState<R, G>) -> Router
where
    R: AuthStore,
    G: AuthGateway + Send + Sync + 'static,
{
    let device = AuthMiddlewareState::from(&state);

    Router::new()
        .route("/login", post(handlers::login::<R, G>))
        .route("/login/lockout", get(handlers::lockout_status::<R, G>))
        .route("/login/lockout/stream", get(handlers::lockout_stream::<R, G>))
        .route("/logout", post(handlers::logout::<R, G>))
        .route("/session", get(handlers::session::<R, G>))
        .route("/events", get(handlers::events::<R, G>))
        .route("/signup", get(handlers::signup_view::<R, G>))
        .route("/signup/start", post(handlers::signup_start::<R, G>))
        .route("/signup/send-otp", post(handlers::signup_send_otp::<R, G>))
        .route("/signup/resend-otp", post(handlers::signup_resend_otp::<R, G>))
        .route("/signup/resend/stream", get(handlers::signup_resend_stream::<R, G>))
        .route("/signup/verify-otp", post(handlers::signup_verify_otp::<R, G>))
        .route("/signup/personal", post(handlers::signup_personal::<R, G>))
        .route("/signup/finalize", post(handlers::signup_finalize::<R, G>))
        .route("/signup/back", post(handlers::signup_back::<R, G>))
        .route("/oauth/{provider}", get(handlers::oauth_start::<R, G>))
        .route("/callback", get(handlers::oauth_callback::<R, G>))
        .route(
            "/onboarding",
            get(handlers::onboarding_check::<R, G>).post(handlers::onboarding_submit::<R, G>),
        )
        .route("/username-preview", get(handlers::username_preview))
        .route("/password-strength", post(handlers::password_strength))
        .layer(from_fn_with_state(device, assign_device::<R>))
        .with_state(state)
}
