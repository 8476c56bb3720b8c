//! Billing Entities

use chrono::{DateTime, Utc};
use kernel::id::{SubscriptionId, UserId};
use serde::Serialize;

use super::value_objects::{PlanType, PromoCode};

/// Catalogue entry; prices are whole so'm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_type: PlanType,
    /// Amount charged for one period
    pub price: i64,
    /// Price shown per month
    pub monthly_price: i64,
    pub days: i64,
}

impl Plan {
    pub fn monthly(price: i64) -> Self {
        Self {
            plan_type: PlanType::Monthly,
            price,
            monthly_price: price,
            days: 30,
        }
    }

    pub fn yearly(monthly_price: i64) -> Self {
        Self {
            plan_type: PlanType::Yearly,
            price: monthly_price * 12,
            monthly_price,
            days: 365,
        }
    }

    /// What the yearly plan saves against twelve monthly periods
    pub fn savings_against(&self, monthly: &Plan) -> i64 {
        let periods = self.days / monthly.days.max(1);
        (monthly.price * periods.min(12) - self.price).max(0)
    }
}

/// Stored subscription row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub amount: i64,
    pub promo_code: Option<String>,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Subscription {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

/// Row to insert on subscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub amount: i64,
    pub promo_code: Option<PromoCode>,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub expires_at: DateTime<Utc>,
}

/// Result of `validate_promo_code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidation {
    pub valid: bool,
    pub message: Option<String>,
    pub discount_percent: i64,
    pub discount_amount: i64,
    pub free_days: i64,
}

impl PromoValidation {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            discount_percent: 0,
            discount_amount: 0,
            free_days: 0,
        }
    }
}
