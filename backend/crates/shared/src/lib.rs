//! Shared Kernel - vocabulary shared by every Smart-Dokon backend crate
//!
//! Only things with one meaning across domains live here:
//! - The unified error type and its HTTP classification
//! - Typed ID wrappers (user, subscription, signup flow, session)
//! - The authenticated principal handed from auth middleware to other routers

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
