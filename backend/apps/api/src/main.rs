//! API Server Entry Point
//!
//! Wires the auth and billing routers onto one axum app.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use auth::middleware::{AuthMiddlewareState, require_auth_session};
use auth::{AuthAppState, AuthConfig, GoTrueGateway, PgAuthStore, auth_router};
use axum::middleware::from_fn_with_state;
use axum::{
    Router, http,
    http::{Method, header},
};
use billing::{BillingAppState, BillingConfig, PgSubscriptionStore, billing_router};
use platform::clock::{Clock, SystemClock};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Expired sessions and idle signup flows
const HOUSEKEEPING_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,billing=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Auth: GoTrue for identities, Postgres for profiles, lockout and sessions
    let auth_config = if cfg!(debug_assertions) && env::var("SESSION_SECRET").is_err() {
        tracing::warn!("SESSION_SECRET not set, using a random development secret");
        AuthConfig {
            gotrue_url: env::var("GOTRUE_URL").context("GOTRUE_URL must be set")?,
            anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            ..AuthConfig::development()
        }
    } else {
        AuthConfig::from_env()?
    };
    let gateway = GoTrueGateway::new(auth_config.gotrue_url.clone(), auth_config.anon_key.clone());
    let auth_state = AuthAppState::new(
        PgAuthStore::new(pool.clone()),
        gateway,
        auth_config,
        clock.clone(),
    )?;

    // first tick runs immediately, so this also cleans up at startup
    let _housekeeping = auth_state.spawn_housekeeping(HOUSEKEEPING_EVERY);

    let guard = AuthMiddlewareState::from(&auth_state);

    // Billing: every route behind the session guard
    let billing_state = BillingAppState::new(
        PgSubscriptionStore::new(pool.clone()),
        BillingConfig::from_env()?,
        clock,
    );
    let billing = billing_router(billing_state).route_layer(from_fn_with_state(
        guard,
        require_auth_session::<PgAuthStore>,
    ));

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = platform::config::split_list(&frontend_origins)
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    let app = Router::new()
        .nest("/api/auth", auth_router(auth_state))
        .nest("/api/billing", billing)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = platform::config::env_or("LISTEN_ADDR", "0.0.0.0:31113")
        .parse()
        .context("LISTEN_ADDR must be host:port")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
