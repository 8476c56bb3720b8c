//! Repository Traits

use kernel::id::UserId;

use super::entities::{NewSubscription, PromoValidation, Subscription};
use super::value_objects::PromoCode;
use crate::error::BillingResult;

/// Subscription persistence and the promo-code procedures
#[trait_variant::make(SubscriptionStore: Send)]
pub trait LocalSubscriptionStore {
    async fn has_active_subscription(&self, user_id: &UserId) -> BillingResult<bool>;

    async fn get_active_subscription(&self, user_id: &UserId)
    -> BillingResult<Option<Subscription>>;

    /// `None` when the procedure returned no row
    async fn validate_promo_code(&self, code: &PromoCode)
    -> BillingResult<Option<PromoValidation>>;

    async fn increment_promo_usage(&self, code: &PromoCode) -> BillingResult<()>;

    async fn insert_subscription(&self, sub: &NewSubscription) -> BillingResult<Subscription>;
}
