//! Password policies
//!
//! Signup enforces the full policy. Login only checks the minimum length,
//! accounts created under older rules must still be able to sign in.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::ClearTextPassword;

use crate::domain::validator::{
    LOGIN_PASSWORD_MIN, is_valid_login_password, is_valid_signup_password, passwords_match,
};

/// Password chosen during signup, checked against its confirmation
#[derive(Debug)]
pub struct SignupPassword(ClearTextPassword);

impl SignupPassword {
    pub fn new(password: &str, confirm: &str) -> AppResult<Self> {
        if !is_valid_signup_password(password) {
            return Err(AppError::bad_request(
                "Password needs at least 8 characters, 1 uppercase letter and 1 digit",
            ));
        }
        if !passwords_match(password, confirm) {
            return Err(AppError::bad_request("Passwords do not match"));
        }
        Ok(Self(ClearTextPassword::new(password)))
    }

    pub fn into_inner(self) -> ClearTextPassword {
        self.0
    }
}

/// Password typed on the login form
#[derive(Debug)]
pub struct LoginPassword(ClearTextPassword);

impl LoginPassword {
    pub fn new(password: &str) -> AppResult<Self> {
        if !is_valid_login_password(password) {
            return Err(AppError::bad_request(format!(
                "Password must be at least {LOGIN_PASSWORD_MIN} characters"
            )));
        }
        Ok(Self(ClearTextPassword::new(password)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}
