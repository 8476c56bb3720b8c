//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Postgres / in-memory stores and the GoTrue client
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Three-factor login (username + email + password) with device lockout
//! - Four-step email signup confirmed by a one-time code
//! - Google sign-in (PKCE) and the onboarding gate for incomplete profiles
//! - Server-side sessions with signed cookie tokens
//!
//! ## Security Model
//! - Passwords are forwarded to the auth provider and zeroized afterwards
//! - Provider tokens stay on the server; the cookie holds a signed session id
//! - Five failed logins lock the device (`sd_device` cookie) for two minutes

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{GoTrueGateway, MemoryAuthStore, PgAuthStore};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
