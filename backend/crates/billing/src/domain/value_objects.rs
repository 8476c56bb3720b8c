//! Billing Value Objects

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BillingError;

/// Subscription plan; wire values match `subscriptions.plan_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[display("monthly")]
    Monthly,
    #[display("yearly")]
    Yearly,
}

impl PlanType {
    pub const ALL: [PlanType; 2] = [PlanType::Monthly, PlanType::Yearly];
}

impl FromStr for PlanType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanType::ALL
            .into_iter()
            .find(|p| p.to_string() == s)
            .ok_or_else(|| BillingError::UnknownPlan(s.to_string()))
    }
}

/// Promo code as looked up: trimmed and upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    /// `None` for blank input
    pub fn normalize(raw: &str) -> Option<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return None;
        }
        Some(Self(code.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromoCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_type_wire_values() {
        assert_eq!("monthly".parse::<PlanType>().unwrap(), PlanType::Monthly);
        assert_eq!(PlanType::Yearly.to_string(), "yearly");
        assert_eq!(serde_json::to_string(&PlanType::Yearly).unwrap(), "\"yearly\"");
        assert!(matches!(
            "weekly".parse::<PlanType>(),
            Err(BillingError::UnknownPlan(_))
        ));
    }

    #[test]
    fn test_promo_code_normalized() {
        assert_eq!(PromoCode::normalize("  start25 ").unwrap().as_str(), "START25");
        assert!(PromoCode::normalize("   ").is_none());
        assert!(PromoCode::normalize("").is_none());
    }
}
