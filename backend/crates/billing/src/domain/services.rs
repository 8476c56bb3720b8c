//! Domain Services
//!
//! Pure pricing logic.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::entities::{Plan, PromoValidation};
use super::value_objects::PlanType;

/// Price breakdown for one plan with an optional promo applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub plan_type: PlanType,
    pub amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub days: i64,
    pub free_days: i64,
}

impl Quote {
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.days + self.free_days)
    }
}

/// Percent discount wins over a fixed amount; invalid promos are ignored
pub fn quote(plan: &Plan, promo: Option<&PromoValidation>) -> Quote {
    let promo = promo.filter(|p| p.valid);
    let discount = match promo {
        Some(p) if p.discount_percent > 0 => {
            let pct = p.discount_percent.min(100);
            plan.price * pct / 100
        }
        Some(p) if p.discount_amount > 0 => p.discount_amount.min(plan.price),
        _ => 0,
    };

    Quote {
        plan_type: plan.plan_type,
        amount: plan.price,
        discount_amount: discount,
        final_amount: (plan.price - discount).max(0),
        days: plan.days,
        free_days: promo.map(|p| p.free_days.max(0)).unwrap_or(0),
    }
}
