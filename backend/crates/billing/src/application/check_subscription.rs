//! Check Subscription Use Case
//!
//! Gate for paid pages. Lookup failures read as "no subscription".

use std::sync::Arc;

use kernel::id::UserId;
use serde::Serialize;

use crate::domain::entities::Subscription;
use crate::domain::repository::SubscriptionStore;
use crate::error::BillingResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub active: bool,
    pub subscription: Option<Subscription>,
}

impl SubscriptionStatus {
    pub fn none() -> Self {
        Self {
            active: false,
            subscription: None,
        }
    }
}

pub struct CheckSubscriptionUseCase<R>
where
    R: SubscriptionStore,
{
    repo: Arc<R>,
}

impl<R> CheckSubscriptionUseCase<R>
where
    R: SubscriptionStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> SubscriptionStatus {
        match self.lookup(user_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Subscription lookup failed");
                SubscriptionStatus::none()
            }
        }
    }

    async fn lookup(&self, user_id: &UserId) -> BillingResult<SubscriptionStatus> {
        if !self.repo.has_active_subscription(user_id).await? {
            return Ok(SubscriptionStatus::none());
        }
        let subscription = self.repo.get_active_subscription(user_id).await?;
        Ok(SubscriptionStatus {
            active: true,
            subscription,
        })
    }
}
