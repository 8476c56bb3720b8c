//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. The `#[error]` text is what the owner
//! sees, so provider messages are carried through verbatim.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::entity::signup_draft::FieldError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Remaining attempts before the device is locked
pub const ATTEMPTS_LEFT_HEADER: &str = "x-attempts-left";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form validation (one message per step)
    #[error("{0}")]
    Validation(String),

    /// Device is locked after too many failed logins
    #[error("Login is blocked for {remaining_secs} seconds")]
    Locked { remaining_secs: u64 },

    /// A login failure that was counted against the device
    #[error("{cause}")]
    CountedFailure {
        cause: Box<AuthError>,
        attempts_left: u32,
        /// Set when this failure started the lock
        locked_for_secs: Option<u64>,
    },

    #[error("Email or password is wrong")]
    InvalidCredentials,

    #[error("Profile not found, contact support")]
    ProfileNotFound,

    #[error("Username is wrong")]
    UsernameMismatch,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Code is wrong or expired")]
    OtpInvalid,

    #[error("Profile save failed: {0}")]
    ProfileSave(String),

    /// Finalize without an authenticated user
    #[error("User not found, please re-authenticate")]
    UserMissing,

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Signup flow not found or expired")]
    FlowNotFound,

    #[error("This step is not available now")]
    WrongStep,

    #[error("request already in progress")]
    Busy,

    #[error("Code can be resent in {remaining_secs} seconds")]
    ResendCooldown { remaining_secs: u64 },

    /// Error body returned by the auth provider
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Auth provider unreachable")]
    Http(#[from] reqwest::Error),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::MissingHeader(_) | AuthError::OtpInvalid => {
                ErrorKind::BadRequest
            }
            AuthError::Locked { .. } => ErrorKind::Locked,
            AuthError::CountedFailure { cause, .. } => cause.kind(),
            AuthError::InvalidCredentials
            | AuthError::UsernameMismatch
            | AuthError::UserMissing
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::ProfileNotFound | AuthError::FlowNotFound => ErrorKind::NotFound,
            AuthError::AccountDisabled => ErrorKind::Forbidden,
            AuthError::WrongStep | AuthError::Busy => ErrorKind::Conflict,
            AuthError::ResendCooldown { .. } => ErrorKind::TooManyRequests,
            AuthError::Provider { status, .. } => match *status {
                429 => ErrorKind::TooManyRequests,
                400..=499 => ErrorKind::UnprocessableEntity,
                _ => ErrorKind::BadGateway,
            },
            AuthError::ProfileSave(_) | AuthError::Http(_) => ErrorKind::BadGateway,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Seconds until the client may try again, if bounded
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AuthError::Locked { remaining_secs } | AuthError::ResendCooldown { remaining_secs } => {
                Some(*remaining_secs)
            }
            AuthError::CountedFailure {
                locked_for_secs, ..
            } => *locked_for_secs,
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        let err = match self.retry_after_secs() {
            Some(secs) => err.with_retry_after(secs),
            None => err,
        };
        match self {
            AuthError::ProfileNotFound | AuthError::AccountDisabled => {
                err.with_action("Contact support")
            }
            AuthError::UserMissing | AuthError::SessionInvalid => err.with_action("Sign in again"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Http(e) => {
                tracing::error!(error = %e, "Auth provider request failed");
            }
            AuthError::ProfileSave(msg) => {
                tracing::error!(message = %msg, "Profile upsert failed");
            }
            AuthError::Provider { status, message } if *status >= 500 => {
                tracing::error!(status, message = %message, "Auth provider error");
            }
            AuthError::CountedFailure {
                cause,
                attempts_left,
                ..
            } => {
                tracing::warn!(error = %cause, attempts_left, "Failed login attempt");
            }
            AuthError::Locked { remaining_secs } => {
                tracing::warn!(remaining_secs, "Login attempt on locked device");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let attempts_left = match &self {
            AuthError::CountedFailure { attempts_left, .. } => Some(*attempts_left),
            _ => None,
        };
        let mut response = self.to_app_error().into_response();
        if let Some(left) = attempts_left {
            response
                .headers_mut()
                .insert(ATTEMPTS_LEFT_HEADER, HeaderValue::from(left));
        }
        response
    }
}

impl From<FieldError> for AuthError {
    fn from(err: FieldError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header.to_string())
            }
        }
    }
}
