//! Free-text names: the owner's full name and the shop name

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::validator::{NAME_MIN, is_valid_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullName(String);

impl FullName {
    pub fn new(raw: &str) -> AppResult<Self> {
        if !is_valid_name(raw) {
            return Err(AppError::bad_request(format!(
                "Full name needs at least {NAME_MIN} characters"
            )));
        }
        Ok(Self(raw.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopName(String);

impl ShopName {
    pub fn new(raw: &str) -> AppResult<Self> {
        if !is_valid_name(raw) {
            return Err(AppError::bad_request(format!(
                "Shop name needs at least {NAME_MIN} characters"
            )));
        }
        Ok(Self(raw.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
