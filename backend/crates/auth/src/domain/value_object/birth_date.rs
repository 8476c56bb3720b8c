use chrono::NaiveDate;
use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::validator::{AGE_MAX, AGE_MIN, age_in_year, parse_birth_date};

/// Birth date of a shop owner aged 16 to 100 (year arithmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    pub fn new(raw: &str, current_year: i32) -> AppResult<Self> {
        let date = parse_birth_date(raw)
            .ok_or_else(|| AppError::bad_request("Birth date must be YYYY-MM-DD"))?;
        let age = age_in_year(date, current_year);
        if !(AGE_MIN..=AGE_MAX).contains(&age) {
            return Err(AppError::bad_request(format!(
                "Age must be between {AGE_MIN} and {AGE_MAX}"
            )));
        }
        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// ISO form, as typed into the date input
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}
