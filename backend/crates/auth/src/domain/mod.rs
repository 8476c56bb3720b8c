//! Domain Layer
//!
//! Entities, value objects, validators and repository traits.

pub mod entity;
pub mod onboarding;
pub mod repository;
pub mod validator;
pub mod value_object;

// Re-exports
pub use entity::{auth_session::AuthSession, profile::Profile};
pub use onboarding::{PostAuthRoute, needs_onboarding};
pub use repository::{AuthGateway, AuthStore, LoginMetaStore, ProfileStore, SessionStore};
