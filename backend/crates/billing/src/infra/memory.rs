//! In-memory store
//!
//! Mirrors the database procedures: a subscription is active while
//! `is_active` and not yet expired. Used by tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use platform::clock::Clock;
use tokio::sync::RwLock;

use crate::domain::entities::{NewSubscription, PromoValidation, Subscription};
use crate::domain::repository::SubscriptionStore;
use crate::domain::value_objects::PromoCode;
use crate::error::BillingResult;
use kernel::id::{SubscriptionId, UserId};

#[derive(Clone)]
pub struct MemorySubscriptionStore {
    clock: Arc<dyn Clock>,
    subscriptions: Arc<RwLock<Vec<Subscription>>>,
    promos: Arc<RwLock<HashMap<String, PromoValidation>>>,
    promo_uses: Arc<RwLock<HashMap<String, u32>>>,
}

impl MemorySubscriptionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            subscriptions: Arc::default(),
            promos: Arc::default(),
            promo_uses: Arc::default(),
        }
    }

    /// Register a promo under its upper-cased code
    pub async fn put_promo(&self, code: &str, validation: PromoValidation) {
        self.promos
            .write()
            .await
            .insert(code.trim().to_uppercase(), validation);
    }

    pub async fn promo_uses(&self, code: &str) -> u32 {
        self.promo_uses
            .read()
            .await
            .get(code)
            .copied()
            .unwrap_or(0)
    }

    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    async fn has_active_subscription(&self, user_id: &UserId) -> BillingResult<bool> {
        Ok(self.get_active_subscription(user_id).await?.is_some())
    }

    async fn get_active_subscription(
        &self,
        user_id: &UserId,
    ) -> BillingResult<Option<Subscription>> {
        let now = self.clock.now();
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.user_id == *user_id && s.is_current(now))
            .max_by_key(|s| s.expires_at)
            .cloned())
    }

    async fn validate_promo_code(
        &self,
        code: &PromoCode,
    ) -> BillingResult<Option<PromoValidation>> {
        Ok(self.promos.read().await.get(code.as_str()).cloned())
    }

    async fn increment_promo_usage(&self, code: &PromoCode) -> BillingResult<()> {
        *self
            .promo_uses
            .write()
            .await
            .entry(code.as_str().to_string())
            .or_default() += 1;
        Ok(())
    }

    async fn insert_subscription(&self, new: &NewSubscription) -> BillingResult<Subscription> {
        let sub = Subscription {
            id: SubscriptionId::new(),
            user_id: new.user_id,
            plan_type: new.plan_type,
            amount: new.amount,
            promo_code: new.promo_code.as_ref().map(|c| c.as_str().to_string()),
            discount_amount: new.discount_amount,
            final_amount: new.final_amount,
            expires_at: new.expires_at,
            is_active: true,
        };
        self.subscriptions.write().await.push(sub.clone());
        Ok(sub)
    }
}
