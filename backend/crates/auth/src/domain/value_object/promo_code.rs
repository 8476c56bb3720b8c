use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::validator::{PROMO_CODE_MIN, is_valid_promo_code};

/// Promo code given at signup; mandatory, kept as typed (trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    pub fn new(raw: &str) -> AppResult<Self> {
        if !is_valid_promo_code(raw) {
            return Err(AppError::bad_request(format!(
                "Promo code needs at least {PROMO_CODE_MIN} characters"
            )));
        }
        Ok(Self(raw.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
