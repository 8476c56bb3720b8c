//! Signup Draft
//!
//! Form values collected across the four signup steps. Raw strings are kept
//! as typed so a failed step can be shown again unchanged; each step's
//! `check_*` validates in display order and reports the first failure only.

use platform::password::ClearTextPassword;
use serde::Serialize;

use crate::domain::entity::profile::NewProfile;
use crate::domain::validator::{
    format_phone, is_valid_birth_date, is_valid_email, is_valid_name, is_valid_otp,
    is_valid_phone, is_valid_promo_code, is_valid_signup_password, passwords_match,
};
use crate::domain::value_object::{
    acquisition_source::AcquisitionSource,
    birth_date::BirthDate,
    email::Email,
    otp_code::OtpCode,
    person_name::{FullName, ShopName},
    phone::Phone,
    promo_code::PromoCode,
    shop_type::ShopType,
    user_id::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignupStep {
    CollectCredentials,
    VerifyOtp,
    PersonalDetails,
    ShopDetails,
    Finalized,
}

impl SignupStep {
    /// Step number shown in the progress bar (Finalized is past 4)
    pub fn number(&self) -> u8 {
        match self {
            SignupStep::CollectCredentials => 1,
            SignupStep::VerifyOtp => 2,
            SignupStep::PersonalDetails => 3,
            SignupStep::ShopDetails => 4,
            SignupStep::Finalized => 5,
        }
    }

    /// Back navigation target, only from steps 2 to 4
    pub fn previous(&self) -> Option<SignupStep> {
        match self {
            SignupStep::VerifyOtp => Some(SignupStep::CollectCredentials),
            SignupStep::PersonalDetails => Some(SignupStep::VerifyOtp),
            SignupStep::ShopDetails => Some(SignupStep::PersonalDetails),
            SignupStep::CollectCredentials | SignupStep::Finalized => None,
        }
    }
}

/// One user-facing message per failed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Email format is invalid")]
    Email,
    #[error("Password needs at least 8 characters, 1 uppercase letter and 1 digit")]
    Password,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Full name needs at least 2 characters")]
    SignupFullName,
    #[error("Shop name needs at least 2 characters")]
    SignupShopName,
    #[error("Enter the full 6-digit code")]
    Otp,
    #[error("Enter your full name (at least 2 characters)")]
    FullName,
    #[error("Enter a valid birth date (age must be 16-100)")]
    BirthDate,
    #[error("Enter the phone as +998 XX XXX XX XX")]
    Phone,
    #[error("Select a shop type")]
    ShopType,
    #[error("Enter the shop name")]
    ShopName,
    #[error("Select where you heard about us")]
    Source,
    #[error("Promo code is required (at least 3 characters)")]
    PromoCode,
}

#[derive(Debug, Default)]
pub struct SignupDraft {
    pub email: String,
    pub password: Option<ClearTextPassword>,
    pub confirm: Option<ClearTextPassword>,
    pub otp: String,
    pub full_name: String,
    pub store_name: String,
    pub birth_date: String,
    /// Always kept in `+998 XX XXX XX XX` form
    pub phone: String,
    pub shop_type: String,
    pub source: String,
    pub promo_code: String,
}

impl SignupDraft {
    /// Prefill for a flow entered from an identity provider
    pub fn from_identity(email: Option<String>, full_name: Option<String>) -> Self {
        Self {
            email: email.unwrap_or_default(),
            full_name: full_name.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn set_phone(&mut self, raw: &str) {
        self.phone = format_phone(raw);
    }

    pub fn has_password(&self) -> bool {
        self.password.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Step 1: email, password, confirmation, full name, store name
    pub fn check_credentials(&self) -> Result<Email, FieldError> {
        if !is_valid_email(&self.email) {
            return Err(FieldError::Email);
        }
        let password = self.password.as_ref().map(|p| p.expose()).unwrap_or("");
        let confirm = self.confirm.as_ref().map(|p| p.expose()).unwrap_or("");
        if !is_valid_signup_password(password) {
            return Err(FieldError::Password);
        }
        if !passwords_match(password, confirm) {
            return Err(FieldError::PasswordMismatch);
        }
        if !is_valid_name(&self.full_name) {
            return Err(FieldError::SignupFullName);
        }
        if !is_valid_name(&self.store_name) {
            return Err(FieldError::SignupShopName);
        }
        Email::new(&self.email).map_err(|_| FieldError::Email)
    }

    /// Step 2: shape of the code only; the provider decides if it is right
    pub fn check_otp(&self) -> Result<OtpCode, FieldError> {
        if !is_valid_otp(&self.otp) {
            return Err(FieldError::Otp);
        }
        OtpCode::new(&self.otp).map_err(|_| FieldError::Otp)
    }

    /// Step 3: full name, birth date, phone
    pub fn check_personal(&self, current_year: i32) -> Result<(), FieldError> {
        check_personal_fields(&self.full_name, &self.birth_date, &self.phone, current_year)
    }

    /// Step 4: shop type, store name, source, promo code
    pub fn check_shop(&self) -> Result<(), FieldError> {
        if self.shop_type.parse::<ShopType>().is_err() {
            return Err(FieldError::ShopType);
        }
        if !is_valid_name(&self.store_name) {
            return Err(FieldError::ShopName);
        }
        if self.source.parse::<AcquisitionSource>().is_err() {
            return Err(FieldError::Source);
        }
        if !is_valid_promo_code(&self.promo_code) {
            return Err(FieldError::PromoCode);
        }
        Ok(())
    }

    /// Steps 3 and 4 again, then the profile write with a derived username
    pub fn to_new_profile(&self, id: UserId, current_year: i32) -> Result<NewProfile, FieldError> {
        self.check_personal(current_year)?;
        self.check_shop()?;
        Ok(NewProfile::build(
            id,
            FullName::new(&self.full_name).map_err(|_| FieldError::FullName)?,
            Phone::new(&self.phone).map_err(|_| FieldError::Phone)?,
            BirthDate::new(&self.birth_date, current_year).map_err(|_| FieldError::BirthDate)?,
            ShopName::new(&self.store_name).map_err(|_| FieldError::ShopName)?,
            self.shop_type.parse().map_err(|_| FieldError::ShopType)?,
            Some(self.source.parse().map_err(|_| FieldError::Source)?),
            Some(PromoCode::new(&self.promo_code).map_err(|_| FieldError::PromoCode)?),
        ))
    }
}

/// Shared by signup step 3 and the onboarding form
pub fn check_personal_fields(
    full_name: &str,
    birth_date: &str,
    phone: &str,
    current_year: i32,
) -> Result<(), FieldError> {
    if !is_valid_name(full_name) {
        return Err(FieldError::FullName);
    }
    if !is_valid_birth_date(birth_date, current_year) {
        return Err(FieldError::BirthDate);
    }
    if !is_valid_phone(phone) {
        return Err(FieldError::Phone);
    }
    Ok(())
}
