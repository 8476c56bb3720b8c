//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession,
    login_attempt::LoginAttemptState,
    profile::{NewProfile, Profile},
};
use crate::domain::repository::{LoginMetaStore, ProfileStore, SessionStore};
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;
use kernel::id::SessionId;

/// PostgreSQL-backed auth store
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Profile Store Implementation
// ============================================================================

impl ProfileStore for PgAuthStore {
    async fn find_profile(&self, user_id: &UserId) -> AuthResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                id,
                username,
                full_name,
                phone,
                birth_date::text AS birth_date,
                shop_name,
                shop_type,
                source,
                promo_code,
                is_active,
                created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile))
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                id,
                username,
                full_name,
                phone,
                birth_date,
                shop_name,
                shop_type,
                source,
                promo_code
            ) VALUES ($1, $2, $3, $4, $5::date, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                username = COALESCE(NULLIF(profiles.username, ''), EXCLUDED.username),
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                birth_date = EXCLUDED.birth_date,
                shop_name = EXCLUDED.shop_name,
                shop_type = EXCLUDED.shop_type,
                source = EXCLUDED.source,
                promo_code = EXCLUDED.promo_code
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(profile.username.as_str())
        .bind(profile.full_name.as_str())
        .bind(profile.phone.as_str())
        .bind(profile.birth_date.to_iso())
        .bind(profile.shop_name.as_str())
        .bind(profile.shop_type.to_string())
        .bind(profile.source.map(|s| s.to_string()))
        .bind(profile.promo_code.as_ref().map(|p| p.as_str()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Login Meta Store Implementation
// ============================================================================

impl LoginMetaStore for PgAuthStore {
    async fn load_login_meta(&self, key: &str) -> AuthResult<LoginAttemptState> {
        let row = sqlx::query_as::<_, LoginMetaRow>(
            "SELECT attempts, locked_until_ms FROM login_meta WHERE meta_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| LoginAttemptState {
                attempts: u32::try_from(r.attempts).unwrap_or(0),
                locked_until_ms: r.locked_until_ms,
            })
            .unwrap_or_default())
    }

    async fn save_login_meta(&self, key: &str, state: &LoginAttemptState) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_meta (meta_key, attempts, locked_until_ms, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (meta_key) DO UPDATE SET
                attempts = EXCLUDED.attempts,
                locked_until_ms = EXCLUDED.locked_until_ms,
                updated_at = now()
            "#,
        )
        .bind(key)
        .bind(i32::try_from(state.attempts).unwrap_or(i32::MAX))
        .bind(state.locked_until_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_login_meta(&self, key: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM login_meta WHERE meta_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgAuthStore {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                email,
                display_name,
                access_token,
                refresh_token,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.email)
        .bind(&session.display_name)
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                email,
                display_name,
                access_token,
                refresh_token,
                expires_at_ms,
                created_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthSessionRow::into_session))
    }

    async fn delete_session(&self, session_id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    username: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
    birth_date: Option<String>,
    shop_name: Option<String>,
    shop_type: Option<String>,
    source: Option<String>,
    promo_code: Option<String>,
    is_active: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: UserId::from_uuid(self.id),
            username: self.username,
            full_name: self.full_name,
            phone: self.phone,
            birth_date: self.birth_date,
            shop_name: self.shop_name,
            shop_type: self.shop_type,
            source: self.source,
            promo_code: self.promo_code,
            // NULL means never deactivated
            is_active: self.is_active != Some(false),
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginMetaRow {
    attempts: i32,
    locked_until_ms: i64,
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    email: Option<String>,
    display_name: Option<String>,
    access_token: String,
    refresh_token: Option<String>,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            email: self.email,
            display_name: self.display_name,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}
