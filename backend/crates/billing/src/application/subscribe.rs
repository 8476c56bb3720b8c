//! Subscribe Use Case
//!
//! Re-checks the promo server-side, prices the plan, stores an active
//! subscription and counts the promo use.

use std::sync::Arc;

use kernel::id::UserId;
use platform::clock::Clock;
use serde::Serialize;

use crate::application::config::BillingConfig;
use crate::application::validate_promo::ValidatePromoUseCase;
use crate::domain::entities::{NewSubscription, Subscription};
use crate::domain::repository::SubscriptionStore;
use crate::domain::services::{Quote, quote};
use crate::domain::value_objects::{PlanType, PromoCode};
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone)]
pub struct SubscribeInput {
    pub plan_type: PlanType,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeOutput {
    pub subscription: Subscription,
    pub quote: Quote,
}

pub struct SubscribeUseCase<R>
where
    R: SubscriptionStore,
{
    repo: Arc<R>,
    config: Arc<BillingConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> SubscribeUseCase<R>
where
    R: SubscriptionStore,
{
    pub fn new(repo: Arc<R>, config: Arc<BillingConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: &UserId,
        input: SubscribeInput,
    ) -> BillingResult<SubscribeOutput> {
        let plan = *self.config.plan(input.plan_type);
        let code = input.promo_code.as_deref().and_then(PromoCode::normalize);

        let promo = match &code {
            Some(code) => {
                let validation = ValidatePromoUseCase::new(self.repo.clone(), self.config.clone())
                    .check(code)
                    .await;
                if !validation.valid {
                    return Err(BillingError::PromoRejected(
                        validation
                            .message
                            .unwrap_or_else(|| self.config.promo_not_found_message.clone()),
                    ));
                }
                Some(validation)
            }
            None => None,
        };

        let quote = quote(&plan, promo.as_ref());
        let new = NewSubscription {
            user_id: *user_id,
            plan_type: plan.plan_type,
            amount: quote.amount,
            promo_code: code.clone(),
            discount_amount: quote.discount_amount,
            final_amount: quote.final_amount,
            expires_at: quote.expires_at(self.clock.now()),
        };

        let subscription = self
            .repo
            .insert_subscription(&new)
            .await
            .map_err(|e| BillingError::SubscriptionSave(e.to_string()))?;

        if let Some(code) = &code {
            // the subscription already exists; a lost counter bump is only logged
            if let Err(e) = self.repo.increment_promo_usage(code).await {
                tracing::warn!(code = %code, error = %e, "Promo usage increment failed");
            }
        }

        tracing::info!(
            user_id = %user_id,
            plan = %plan.plan_type,
            final_amount = quote.final_amount,
            expires_at = %subscription.expires_at,
            "Subscription created"
        );

        Ok(SubscribeOutput {
            subscription,
            quote,
        })
    }
}
