//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::config::{ConfigError, env_or, parse_env, require_env};
use platform::cookie::CookieConfig;
use platform::crypto::random_bytes;
use platform::lockout::LockoutPolicy;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// GoTrue base URL, e.g. `https://<project>.supabase.co/auth/v1`
    pub gotrue_url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    /// HMAC key for session, signup-flow and device cookies
    pub session_secret: [u8; 32],
    /// Origin the browser sees; OAuth redirects are built from it
    pub public_origin: String,
    /// Backend session lifetime (1 week)
    pub session_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// 5 failures, 120 s lock
    pub lockout: LockoutPolicy,
    /// Wait between one-time code mails
    pub resend_cooldown: Duration,
    /// Idle signup flows are dropped after this
    pub flow_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            gotrue_url: "http://localhost:9999".to_string(),
            anon_key: String::new(),
            session_secret: [0u8; 32],
            public_origin: "http://localhost:3000".to_string(),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            lockout: LockoutPolicy::default(),
            resend_cooldown: Duration::from_secs(60),
            flow_ttl: Duration::from_secs(3600),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("gotrue_url", &self.gotrue_url)
            .field("public_origin", &self.public_origin)
            .field("cookie_secure", &self.cookie_secure)
            .field("lockout", &self.lockout)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&random_bytes(32));
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// `GOTRUE_URL`, `SUPABASE_ANON_KEY`, `SESSION_SECRET` (>= 32 bytes),
    /// `PUBLIC_ORIGIN`, optional `COOKIE_SECURE`
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = require_env("SESSION_SECRET")?;
        if secret.len() < 32 {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET".to_string(),
                message: "must be at least 32 bytes".to_string(),
            });
        }
        let digest = platform::crypto::sha256(secret.as_bytes());

        Ok(Self {
            gotrue_url: require_env("GOTRUE_URL")?.trim_end_matches('/').to_string(),
            anon_key: require_env("SUPABASE_ANON_KEY")?,
            session_secret: digest,
            public_origin: env_or("PUBLIC_ORIGIN", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            cookie_secure: parse_env::<bool>("COOKIE_SECURE")?.unwrap_or(true),
            ..Default::default()
        })
    }

    pub fn session_ttl_ms(&self) -> i64 {
        i64::try_from(self.session_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// OAuth redirect target registered with the provider
    pub fn callback_url(&self) -> String {
        format!("{}/api/auth/callback", self.public_origin)
    }

    pub fn session_cookie(&self) -> CookieConfig {
        self.apply(CookieConfig::session())
    }

    pub fn flow_cookie(&self) -> CookieConfig {
        self.apply(CookieConfig::signup_flow())
    }

    pub fn device_cookie(&self) -> CookieConfig {
        self.apply(CookieConfig::device())
    }

    pub fn verifier_cookie(&self) -> CookieConfig {
        self.apply(CookieConfig::oauth_verifier())
    }

    fn apply(&self, mut cookie: CookieConfig) -> CookieConfig {
        cookie.same_site = self.cookie_same_site;
        if self.cookie_secure {
            cookie
        } else {
            cookie.insecure()
        }
    }
}
