//! Billing - subscription gate for the Smart-Dokon dashboard
//!
//! Clean Architecture structure:
//! - `domain/` - Plans, subscriptions, promo pricing, repository traits
//! - `application/` - Use cases (status check, promo validation, subscribe)
//! - `infra/` - PostgreSQL procedures and an in-memory store
//! - `presentation/` - HTTP handlers
//!
//! ## Rules
//! - Prices come from [`BillingConfig`], never from the client
//! - Promo codes are trimmed and upper-cased, then re-checked on subscribe
//! - A percent discount wins over a fixed amount; free days extend expiry
//! - A failed status lookup reads as "no subscription"

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::config::BillingConfig;
pub use error::{BillingError, BillingResult};
pub use infra::{MemorySubscriptionStore, PgSubscriptionStore};
pub use presentation::{BillingAppState, billing_router, billing_router_generic};

pub mod models {
    pub use crate::application::check_subscription::SubscriptionStatus;
    pub use crate::domain::entities::*;
    pub use crate::domain::services::Quote;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}
