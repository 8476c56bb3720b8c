use kernel::error::app_error::{AppError, AppResult};

use crate::domain::validator::is_valid_otp;

/// Six ASCII digits, as mailed by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn new(raw: &str) -> AppResult<Self> {
        if !is_valid_otp(raw) {
            return Err(AppError::bad_request("Code must be exactly 6 digits"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
