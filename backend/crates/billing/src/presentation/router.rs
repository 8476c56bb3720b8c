//! Billing Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::SubscriptionStore;
use crate::infra::PgSubscriptionStore;
use crate::presentation::handlers::{self, BillingAppState};

/// Create the Billing router with PostgreSQL storage
///
/// The caller layers the auth guard on top; handlers expect a `CurrentUser`.
pub fn billing_router(state: BillingAppState<PgSubscriptionStore>) -> Router {
    billing_router_generic(state)
}

/// Create a generic Billing router for any store implementation
pub fn billing_router_generic<R>(state: BillingAppState<R>) -> Router
where
    R: SubscriptionStore + Send + Sync + 'static,
{
    Router::new()
        .route("/plans", get(handlers::plans::<R>))
        .route("/status", get(handlers::status::<R>))
        .route("/promo/validate", post(handlers::validate_promo::<R>))
        .route("/subscribe", post(handlers::subscribe::<R>))
        .with_state(state)
}
