//! Repository Traits
//!
//! Ports to the auth provider and to persistence. Implementations live in
//! the infrastructure layer.

use platform::password::ClearTextPassword;

use crate::domain::entity::{
    auth_session::AuthSession,
    login_attempt::LoginAttemptState,
    profile::{NewProfile, Profile},
};
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProvider, otp_code::OtpCode, user_id::UserId,
};
use crate::error::AuthResult;
use kernel::id::SessionId;

/// User as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: UserId,
    pub email: Option<String>,
    /// `full_name` metadata claim, falling back to `name`
    pub display_name: Option<String>,
}

/// Tokens issued by the auth provider
#[derive(Clone)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds
    pub expires_in: Option<i64>,
    pub user: ProviderUser,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Auth provider (password, one-time code, OAuth)
#[trait_variant::make(AuthGateway: Send)]
pub trait LocalAuthGateway {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> AuthResult<ProviderSession>;

    /// Mail a one-time code, creating the user when `create_user` is set
    async fn send_otp(&self, email: &Email, create_user: bool) -> AuthResult<()>;

    async fn verify_otp(&self, email: &Email, code: &OtpCode) -> AuthResult<ProviderSession>;

    async fn update_password(
        &self,
        access_token: &str,
        password: &ClearTextPassword,
    ) -> AuthResult<()>;

    /// Provider authorize URL for a PKCE code flow
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> String;

    async fn exchange_code(&self, code: &str, code_verifier: &str)
    -> AuthResult<ProviderSession>;

    async fn get_user(&self, access_token: &str) -> AuthResult<ProviderUser>;

    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
}

/// `profiles` table
#[trait_variant::make(ProfileStore: Send)]
pub trait LocalProfileStore {
    async fn find_profile(&self, user_id: &UserId) -> AuthResult<Option<Profile>>;

    /// Insert or update by id; an existing username is never overwritten
    async fn upsert_profile(&self, profile: &NewProfile) -> AuthResult<()>;
}

/// Failed-login counters, keyed by `sd_login_meta:<device>`
#[trait_variant::make(LoginMetaStore: Send)]
pub trait LocalLoginMetaStore {
    /// Default state when nothing is stored
    async fn load_login_meta(&self, key: &str) -> AuthResult<LoginAttemptState>;

    async fn save_login_meta(&self, key: &str, state: &LoginAttemptState) -> AuthResult<()>;

    async fn clear_login_meta(&self, key: &str) -> AuthResult<()>;
}

/// Backend sessions
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn find_session(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>>;

    async fn delete_session(&self, session_id: &SessionId) -> AuthResult<()>;

    async fn purge_expired_sessions(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Everything the auth use cases persist, behind one handle
pub trait AuthStore:
    ProfileStore + LoginMetaStore + SessionStore + Clone + Send + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: ProfileStore + LoginMetaStore + SessionStore + Clone + Send + Sync + 'static
{
}
