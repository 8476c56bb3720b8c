//! Onboarding Use Case
//!
//! Standalone completion form for accounts whose profile is missing
//! required fields (OAuth sign-ups, older accounts).

use std::sync::Arc;

use platform::clock::Clock;
use serde::Serialize;

use crate::application::sign_up::save_profile;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::profile::{NewProfile, Profile};
use crate::domain::entity::signup_draft::{FieldError, check_personal_fields};
use crate::domain::onboarding::PostAuthRoute;
use crate::domain::repository::{AuthStore, ProfileStore};
use crate::domain::validator::{format_phone, is_valid_name, is_valid_promo_code};
use crate::domain::value_object::{
    acquisition_source::AcquisitionSource,
    birth_date::BirthDate,
    person_name::{FullName, ShopName},
    phone::Phone,
    promo_code::PromoCode,
    shop_type::ShopType,
    user_id::UserId,
    user_name::Username,
};
use crate::error::{AuthError, AuthResult};

/// Onboarding form values, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
    pub shop_type: String,
    pub shop_name: String,
    pub source: String,
    pub promo_code: String,
}

impl OnboardingForm {
    fn prefill(profile: Option<&Profile>, session: &AuthSession) -> Self {
        let field = |v: Option<&String>| v.cloned().unwrap_or_default();
        Self {
            full_name: profile
                .and_then(|p| p.full_name.clone())
                .or_else(|| session.display_name.clone())
                .unwrap_or_default(),
            birth_date: field(profile.and_then(|p| p.birth_date.as_ref())),
            phone: field(profile.and_then(|p| p.phone.as_ref())),
            shop_type: field(profile.and_then(|p| p.shop_type.as_ref())),
            shop_name: field(profile.and_then(|p| p.shop_name.as_ref())),
            source: field(profile.and_then(|p| p.source.as_ref())),
            promo_code: field(profile.and_then(|p| p.promo_code.as_ref())),
        }
    }

    /// Name, birth date, phone, shop name, shop type, promo code; source optional
    pub fn validate(&self, current_year: i32) -> Result<(), FieldError> {
        check_personal_fields(
            &self.full_name,
            &self.birth_date,
            &format_phone(&self.phone),
            current_year,
        )?;
        if !is_valid_name(&self.shop_name) {
            return Err(FieldError::ShopName);
        }
        if self.shop_type.parse::<ShopType>().is_err() {
            return Err(FieldError::ShopType);
        }
        if !is_valid_promo_code(&self.promo_code) {
            return Err(FieldError::PromoCode);
        }
        if !self.source.trim().is_empty() && self.source.parse::<AcquisitionSource>().is_err() {
            return Err(FieldError::Source);
        }
        Ok(())
    }

    fn to_new_profile(&self, id: UserId, current_year: i32) -> Result<NewProfile, FieldError> {
        self.validate(current_year)?;
        let source = match self.source.trim() {
            "" => None,
            s => Some(s.parse().map_err(|_| FieldError::Source)?),
        };
        Ok(NewProfile::build(
            id,
            FullName::new(&self.full_name).map_err(|_| FieldError::FullName)?,
            Phone::new(&self.phone).map_err(|_| FieldError::Phone)?,
            BirthDate::new(&self.birth_date, current_year).map_err(|_| FieldError::BirthDate)?,
            ShopName::new(&self.shop_name).map_err(|_| FieldError::ShopName)?,
            self.shop_type.parse().map_err(|_| FieldError::ShopType)?,
            source,
            Some(PromoCode::new(&self.promo_code).map_err(|_| FieldError::PromoCode)?),
        ))
    }
}

/// Result of the page's self-check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingCheck {
    pub route: Option<PostAuthRoute>,
    pub form: Option<OnboardingForm>,
}

impl OnboardingCheck {
    fn redirect(route: PostAuthRoute) -> Self {
        Self {
            route: Some(route),
            form: None,
        }
    }
}

#[derive(Debug)]
pub struct OnboardingOutput {
    pub username: Username,
    pub route: PostAuthRoute,
}

/// Onboarding use case
pub struct OnboardingUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> OnboardingUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// No session → login; complete profile → root; otherwise the form
    pub async fn check(&self, session: Option<&AuthSession>) -> OnboardingCheck {
        let Some(session) = session else {
            return OnboardingCheck::redirect(PostAuthRoute::Login);
        };
        let profile = match self.repo.find_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %session.user_id, "Onboarding profile check failed");
                return OnboardingCheck::redirect(PostAuthRoute::Login);
            }
        };
        if PostAuthRoute::for_profile(profile.as_ref()) == PostAuthRoute::Root {
            return OnboardingCheck::redirect(PostAuthRoute::Root);
        }
        OnboardingCheck {
            route: None,
            form: Some(OnboardingForm::prefill(profile.as_ref(), session)),
        }
    }

    /// Validate then upsert; an existing username is kept
    pub async fn submit(
        &self,
        user_id: Option<UserId>,
        form: OnboardingForm,
    ) -> AuthResult<OnboardingOutput> {
        let current_year = self.clock.current_year();
        form.validate(current_year)?;
        let user_id = user_id.ok_or(AuthError::UserMissing)?;

        let profile = save_profile(
            self.repo.as_ref(),
            form.to_new_profile(user_id, current_year)?,
        )
        .await?;

        tracing::info!(user_id = %user_id, "Onboarding completed");
        Ok(OnboardingOutput {
            username: profile.username,
            route: PostAuthRoute::Root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> OnboardingForm {
        OnboardingForm {
            full_name: "Ali Valiyev".into(),
            birth_date: "1995-07-14".into(),
            phone: "901234567".into(),
            shop_type: "kiyim".into(),
            shop_name: "Mega".into(),
            source: String::new(),
            promo_code: "START".into(),
        }
    }

    #[test]
    fn test_source_is_optional() {
        assert!(form().validate(2025).is_ok());
        let mut bad = form();
        bad.source = "tiktok".into();
        assert_eq!(bad.validate(2025).unwrap_err(), FieldError::Source);
    }

    #[test]
    fn test_validation_order() {
        let mut f = form();
        f.shop_name = "M".into();
        f.shop_type = String::new();
        assert_eq!(f.validate(2025).unwrap_err(), FieldError::ShopName);

        let mut f = form();
        f.promo_code = "AB".into();
        assert_eq!(f.validate(2025).unwrap_err(), FieldError::PromoCode);
    }
}
