//! Email Value Object
//!
//! Format check only; ownership is proven by the one-time code.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::validator::is_valid_email;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Email address, stored lowercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Validate the raw input as typed, then normalize
    pub fn new(email: impl AsRef<str>) -> AppResult<Self> {
        let raw = email.as_ref();

        if raw.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }
        if raw.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }
        if !is_valid_email(raw) {
            return Err(AppError::bad_request("Invalid email format"));
        }

        Ok(Self(raw.trim().to_lowercase()))
    }

    /// From the auth provider or the database (already validated)
    pub fn from_trusted(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
