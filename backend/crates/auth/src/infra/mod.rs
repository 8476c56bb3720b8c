//! Infrastructure Layer
//!
//! Database implementations and the auth provider client.

pub mod gotrue;
pub mod memory;
pub mod postgres;

pub use gotrue::GoTrueGateway;
pub use memory::MemoryAuthStore;
pub use postgres::PgAuthStore;
