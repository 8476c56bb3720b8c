//! In-memory store
//!
//! Same semantics as [`super::postgres::PgAuthStore`], including the
//! write-once username. Used by tests and local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::entity::{
    auth_session::AuthSession,
    login_attempt::LoginAttemptState,
    profile::{NewProfile, Profile},
};
use crate::domain::repository::{LoginMetaStore, ProfileStore, SessionStore};
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;
use kernel::id::SessionId;

#[derive(Debug, Clone, Default)]
pub struct MemoryAuthStore {
    profiles: Arc<RwLock<HashMap<UserId, Profile>>>,
    login_meta: Arc<RwLock<HashMap<String, LoginAttemptState>>>,
    sessions: Arc<RwLock<HashMap<SessionId, AuthSession>>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row, as the provider's signup trigger would
    pub async fn put_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl ProfileStore for MemoryAuthStore {
    async fn find_profile(&self, user_id: &UserId) -> AuthResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn upsert_profile(&self, new: &NewProfile) -> AuthResult<()> {
        let mut profiles = self.profiles.write().await;
        let row = profiles
            .entry(new.id)
            .or_insert_with(|| Profile::empty(new.id));

        if row.username.as_deref().is_none_or(str::is_empty) {
            row.username = Some(new.username.as_str().to_string());
        }
        row.full_name = Some(new.full_name.as_str().to_string());
        row.phone = Some(new.phone.as_str().to_string());
        row.birth_date = Some(new.birth_date.to_iso());
        row.shop_name = Some(new.shop_name.as_str().to_string());
        row.shop_type = Some(new.shop_type.to_string());
        row.source = new.source.map(|s| s.to_string());
        row.promo_code = new.promo_code.as_ref().map(|p| p.as_str().to_string());
        Ok(())
    }
}

impl LoginMetaStore for MemoryAuthStore {
    async fn load_login_meta(&self, key: &str) -> AuthResult<LoginAttemptState> {
        Ok(self
            .login_meta
            .read()
            .await
            .get(key)
            .copied()
            .unwrap_or_default())
    }

    async fn save_login_meta(&self, key: &str, state: &LoginAttemptState) -> AuthResult<()> {
        self.login_meta
            .write()
            .await
            .insert(key.to_string(), *state);
        Ok(())
    }

    async fn clear_login_meta(&self, key: &str) -> AuthResult<()> {
        self.login_meta.write().await.remove(key);
        Ok(())
    }
}

impl SessionStore for MemoryAuthStore {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn delete_session(&self, session_id: &SessionId) -> AuthResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now_ms));
        Ok((before - sessions.len()) as u64)
    }
}
