//! Auth provider user id, also the `profiles` primary key

pub use kernel::id::UserId;
