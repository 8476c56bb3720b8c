use derive_more::Display;
use std::str::FromStr;

/// Identity providers enabled on the auth provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OAuthProvider {
    #[display("google")]
    Google,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported sign-in provider: {0}")]
pub struct UnsupportedProvider(pub String);

impl FromStr for OAuthProvider {
    type Err = UnsupportedProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            other => Err(UnsupportedProvider(other.to_string())),
        }
    }
}

impl OAuthProvider {
    /// Extra authorize query parameters
    pub fn authorize_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            // refresh token + account chooser on every sign-in
            OAuthProvider::Google => &[("access_type", "offline"), ("prompt", "consent")],
        }
    }
}
