//! Billing Error Types
//!
//! Billing-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Billing-specific result type alias
pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),

    #[error("Unknown plan: {0:?}")]
    UnknownPlan(String),

    /// Promo code rejected at subscribe time
    #[error("{0}")]
    PromoRejected(String),

    #[error("Subscription save failed: {0}")]
    SubscriptionSave(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Validation(_) | BillingError::UnknownPlan(_) => ErrorKind::BadRequest,
            BillingError::PromoRejected(_) => ErrorKind::UnprocessableEntity,
            BillingError::SubscriptionSave(_)
            | BillingError::Database(_)
            | BillingError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn log(&self) {
        match self {
            BillingError::Database(e) => {
                tracing::error!(error = %e, "Billing database error");
            }
            BillingError::SubscriptionSave(msg) => {
                tracing::error!(message = %msg, "Subscription insert failed");
            }
            BillingError::Internal(msg) => {
                tracing::error!(message = %msg, "Billing internal error");
            }
            _ => {
                tracing::debug!(error = %self, "Billing error");
            }
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message)
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
