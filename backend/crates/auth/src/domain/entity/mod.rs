//! Entities

pub mod auth_session;
pub mod login_attempt;
pub mod profile;
pub mod signup_draft;
