//! Auth Session Entity
//!
//! Backend session wrapping the tokens the auth provider issued. The cookie
//! carries only the signed session id; tokens never leave the server.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::repository::ProviderSession;
use crate::domain::value_object::user_id::UserId;
use kernel::id::SessionId;

#[derive(Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub email: Option<String>,
    /// `full_name` claim, falling back to `name`
    pub display_name: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp ms
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// TTL comes from config, not from the provider token lifetime
    pub fn from_provider(provider: ProviderSession, now: DateTime<Utc>, ttl_ms: i64) -> Self {
        Self {
            session_id: SessionId::new(),
            user_id: provider.user.id,
            email: provider.user.email,
            display_name: provider.user.display_name,
            access_token: provider.access_token,
            refresh_token: provider.refresh_token,
            expires_at_ms: now.timestamp_millis().saturating_add(ttl_ms),
            created_at: now,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish_non_exhaustive()
    }
}
