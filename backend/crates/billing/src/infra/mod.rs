//! Infrastructure Layer

pub mod memory;
pub mod postgres;

pub use memory::MemorySubscriptionStore;
pub use postgres::PgSubscriptionStore;
