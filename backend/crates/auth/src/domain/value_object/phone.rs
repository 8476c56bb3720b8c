//! Phone Number Value Object (Uzbekistan, `+998 XX XXX XX XX`)

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::validator::{format_phone, is_valid_phone};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Formats first, so `901234567` and `+998 90 123 45 67` are the same number
    pub fn new(raw: &str) -> AppResult<Self> {
        let formatted = format_phone(raw);
        if !is_valid_phone(&formatted) {
            return Err(AppError::bad_request(
                "Phone must be in +998 XX XXX XX XX format",
            ));
        }
        Ok(Self(formatted))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
