//! Application Layer - Use Cases

pub mod check_subscription;
pub mod config;
pub mod subscribe;
pub mod validate_promo;
