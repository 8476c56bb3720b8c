//! Authenticated principal
//!
//! The auth middleware resolves the session cookie and inserts a
//! [`CurrentUser`] into request extensions. Other routers (billing) read it
//! without depending on the auth crate.

use serde::Serialize;

use crate::id::UserId;

/// The signed-in user attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl CurrentUser {
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        Self { user_id, email }
    }
}
