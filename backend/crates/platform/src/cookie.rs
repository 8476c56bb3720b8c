//! Cookie helpers
//!
//! The backend issues the signed session cookie, the signed signup-flow
//! cookie, the signed device cookie and a short-lived PKCE verifier cookie.
//! All are HttpOnly.

use axum::http::{HeaderMap, HeaderValue, header};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::session()
    }
}

impl CookieConfig {
    /// `sd_session`: lives as long as the auth provider session (7 days cap)
    pub fn session() -> Self {
        Self {
            name: "sd_session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(7 * 24 * 60 * 60),
        }
    }

    /// `sd_signup`: one signup flow, scoped to the auth API
    pub fn signup_flow() -> Self {
        Self {
            name: "sd_signup".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/api/auth".to_string(),
            max_age_secs: Some(60 * 60),
        }
    }

    /// `sd_oauth_verifier`: PKCE verifier between redirect and callback
    pub fn oauth_verifier() -> Self {
        Self {
            name: "sd_oauth_verifier".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/api/auth".to_string(),
            max_age_secs: Some(10 * 60),
        }
    }

    /// `sd_device`: per-browser id that scopes the login lockout
    pub fn device() -> Self {
        Self {
            name: "sd_device".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/api/auth".to_string(),
            max_age_secs: Some(365 * 24 * 60 * 60),
        }
    }

    /// Local HTTP development (no `Secure` attribute)
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);
        self.push_attributes(&mut cookie);
        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        cookie
    }

    /// Expired cookie with the same attributes so the browser replaces it
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!("{}=", self.name);
        self.push_attributes(&mut cookie);
        cookie.push_str("; Max-Age=0");
        cookie
    }

    fn push_attributes(&self, cookie: &mut String) {
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Set-Cookie header value; an unrepresentable cookie yields `None`
pub fn set_cookie_header(config: &CookieConfig, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_set_cookie(value)).ok()
}

pub fn delete_cookie_header(config: &CookieConfig) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_delete_cookie()).ok()
}
