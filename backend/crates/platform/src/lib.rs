//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business meaning:
//! - Cryptographic utilities (SHA-256, HMAC-signed tokens, Base64)
//! - Secret password handling and strength scoring
//! - Cookie and client fingerprint helpers
//! - Wall clock abstraction and the cancellable 1-second countdown
//! - Environment configuration helpers

pub mod client;
pub mod clock;
pub mod config;
pub mod cookie;
pub mod countdown;
pub mod crypto;
pub mod lockout;
pub mod password;
