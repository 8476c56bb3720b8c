//! Validate Promo Use Case

use std::sync::Arc;

use crate::application::config::BillingConfig;
use crate::domain::entities::PromoValidation;
use crate::domain::repository::SubscriptionStore;
use crate::domain::value_objects::PromoCode;
use crate::error::{BillingError, BillingResult};

pub struct ValidatePromoUseCase<R>
where
    R: SubscriptionStore,
{
    repo: Arc<R>,
    config: Arc<BillingConfig>,
}

impl<R> ValidatePromoUseCase<R>
where
    R: SubscriptionStore,
{
    pub fn new(repo: Arc<R>, config: Arc<BillingConfig>) -> Self {
        Self { repo, config }
    }

    /// Blank input is a validation error; a missing or failed lookup is an invalid promo
    pub async fn execute(&self, raw: &str) -> BillingResult<PromoValidation> {
        let code = PromoCode::normalize(raw)
            .ok_or_else(|| BillingError::Validation("Enter a promo code".to_string()))?;
        Ok(self.check(&code).await)
    }

    pub(crate) async fn check(&self, code: &PromoCode) -> PromoValidation {
        match self.repo.validate_promo_code(code).await {
            Ok(Some(v)) if v.valid => {
                tracing::debug!(code = %code, "Promo code accepted");
                v
            }
            Ok(Some(v)) => PromoValidation {
                message: v
                    .message
                    .or_else(|| Some(self.config.promo_not_found_message.clone())),
                ..PromoValidation::invalid("")
            },
            Ok(None) => PromoValidation::invalid(self.config.promo_not_found_message.clone()),
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "Promo lookup failed");
                PromoValidation::invalid("Promo code could not be checked")
            }
        }
    }
}
