//! API DTOs

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Plan, PromoValidation};
use crate::domain::services::Quote;
use crate::domain::value_objects::PlanType;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
    /// Yearly plan against twelve monthly periods
    pub yearly_savings: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidateRequest {
    pub code: String,
    /// Quote this plan with the promo applied
    #[serde(default)]
    pub plan_type: Option<PlanType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidateResponse {
    #[serde(flatten)]
    pub validation: PromoValidation,
    pub quote: Option<Quote>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_type: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}
