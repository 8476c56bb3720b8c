//! Domain Layer
//!
//! - Entities (Plan, Subscription, PromoValidation)
//! - Value objects (PlanType, PromoCode)
//! - Pricing service (quote)
//! - Repository traits

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
