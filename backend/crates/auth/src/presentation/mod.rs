//! Presentation Layer
//!
//! JSON and SSE handlers, DTOs, the router and the session guard that
//! other routers (billing) layer on top.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{
    AuthMiddlewareState, AuthStatus, assign_device, check_auth_session, require_auth_session,
};
pub use router::{auth_router, auth_router_generic};
