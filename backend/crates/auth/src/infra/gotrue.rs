//! GoTrue (Supabase Auth) gateway
//!
//! REST client for the auth provider. Error bodies come in several shapes
//! (`msg`, `error_description`, `message`, `error`); the first present is
//! surfaced to the owner verbatim.

use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use platform::password::ClearTextPassword;

use crate::domain::repository::{AuthGateway, ProviderSession, ProviderUser};
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProvider, otp_code::OtpCode, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

#[derive(Clone)]
pub struct GoTrueGateway {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl std::fmt::Debug for GoTrueGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        [self.msg, self.error_description, self.message, self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

impl TryFrom<UserResponse> for ProviderUser {
    type Error = AuthError;

    fn try_from(user: UserResponse) -> AuthResult<Self> {
        let id: UserId = user
            .id
            .parse()
            .map_err(|_| AuthError::Internal(format!("Provider user id is not a UUID: {}", user.id)))?;
        let display_name = user
            .user_metadata
            .full_name
            .filter(|n| !n.trim().is_empty())
            .or(user.user_metadata.name);
        Ok(ProviderUser {
            id,
            email: user.email,
            display_name,
        })
    }
}

impl TryFrom<TokenResponse> for ProviderSession {
    type Error = AuthError;

    fn try_from(token: TokenResponse) -> AuthResult<Self> {
        Ok(ProviderSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user.try_into()?,
        })
    }
}

impl GoTrueGateway {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.url(path))
            .header("apikey", &self.anon_key)
    }

    /// Provider error status and message, or the response for success
    async fn check(response: reqwest::Response) -> AuthResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Auth error").to_string());
        tracing::debug!(status = status.as_u16(), message = %message, "Auth provider rejected request");
        Err(AuthError::Provider {
            status: status.as_u16(),
            message,
        })
    }

    async fn session_from(response: reqwest::Response) -> AuthResult<ProviderSession> {
        let token: TokenResponse = Self::check(response).await?.json().await?;
        token.try_into()
    }
}

impl AuthGateway for GoTrueGateway {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> AuthResult<ProviderSession> {
        let response = self
            .post("/token?grant_type=password")
            .json(&json!({ "email": email.as_str(), "password": password }))
            .send()
            .await?;
        Self::session_from(response).await
    }

    async fn send_otp(&self, email: &Email, create_user: bool) -> AuthResult<()> {
        let response = self
            .post("/otp")
            .json(&json!({ "email": email.as_str(), "create_user": create_user }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn verify_otp(&self, email: &Email, code: &OtpCode) -> AuthResult<ProviderSession> {
        let response = self
            .post("/verify")
            .json(&json!({ "type": "email", "email": email.as_str(), "token": code.as_str() }))
            .send()
            .await?;
        Self::session_from(response).await
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &ClearTextPassword,
    ) -> AuthResult<()> {
        let response = self
            .http_client
            .put(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": password.expose() }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> String {
        let provider_name = provider.to_string();
        let mut params = vec![
            ("provider", provider_name.as_str()),
            ("redirect_to", redirect_to),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "s256"),
        ];
        params.extend_from_slice(provider.authorize_params());

        let base = self.url("/authorize");
        match Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            // unparseable base URL: let the browser show the provider error
            Err(_) => base,
        }
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<ProviderSession> {
        let response = self
            .post("/token?grant_type=pkce")
            .json(&json!({ "auth_code": code, "code_verifier": code_verifier }))
            .send()
            .await?;
        Self::session_from(response).await
    }

    async fn get_user(&self, access_token: &str) -> AuthResult<ProviderUser> {
        let response = self
            .http_client
            .get(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let user: UserResponse = Self::check(response).await?.json().await?;
        user.try_into()
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .post("/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
