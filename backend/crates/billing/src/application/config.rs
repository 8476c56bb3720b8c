//! Billing Configuration

use platform::config::{ConfigError, parse_env};

use crate::domain::entities::Plan;
use crate::domain::value_objects::PlanType;

/// Plan catalogue
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub monthly: Plan,
    pub yearly: Plan,
    /// Shown when `validate_promo_code` returns nothing
    pub promo_not_found_message: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            monthly: Plan::monthly(199_990),
            yearly: Plan::yearly(149_999),
            promo_not_found_message: "Promo code not found".to_string(),
        }
    }
}

impl BillingConfig {
    /// Defaults, with `BILLING_MONTHLY_PRICE` / `BILLING_YEARLY_MONTHLY_PRICE` overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let monthly = parse_env::<i64>("BILLING_MONTHLY_PRICE")?
            .map(Plan::monthly)
            .unwrap_or(defaults.monthly);
        let yearly = parse_env::<i64>("BILLING_YEARLY_MONTHLY_PRICE")?
            .map(Plan::yearly)
            .unwrap_or(defaults.yearly);

        for (key, plan) in [
            ("BILLING_MONTHLY_PRICE", &monthly),
            ("BILLING_YEARLY_MONTHLY_PRICE", &yearly),
        ] {
            if plan.price <= 0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    message: "price must be positive".to_string(),
                });
            }
        }

        Ok(Self {
            monthly,
            yearly,
            ..defaults
        })
    }

    pub fn plan(&self, plan_type: PlanType) -> &Plan {
        match plan_type {
            PlanType::Monthly => &self.monthly,
            PlanType::Yearly => &self.yearly,
        }
    }

    pub fn plans(&self) -> [&Plan; 2] {
        [&self.monthly, &self.yearly]
    }
}
