//! HTTP Handlers
//!
//! Every route except `/plans` reads the [`CurrentUser`] that the auth
//! middleware attaches to the request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use kernel::principal::CurrentUser;
use platform::clock::Clock;

use crate::application::check_subscription::CheckSubscriptionUseCase;
use crate::application::config::BillingConfig;
use crate::application::subscribe::{SubscribeInput, SubscribeUseCase};
use crate::application::validate_promo::ValidatePromoUseCase;
use crate::domain::repository::SubscriptionStore;
use crate::domain::services::quote;
use crate::domain::value_objects::PlanType;
use crate::error::BillingResult;
use crate::presentation::dto::{
    PlansResponse, PromoValidateRequest, PromoValidateResponse, SubscribeRequest,
};

/// Shared state for billing handlers
pub struct BillingAppState<R>
where
    R: SubscriptionStore,
{
    pub repo: Arc<R>,
    pub config: Arc<BillingConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R> Clone for BillingAppState<R>
where
    R: SubscriptionStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R> BillingAppState<R>
where
    R: SubscriptionStore,
{
    pub fn new(repo: R, config: BillingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            clock,
        }
    }
}

/// GET /plans
pub async fn plans<R>(State(state): State<BillingAppState<R>>) -> impl IntoResponse
where
    R: SubscriptionStore + Send + Sync + 'static,
{
    let config = &state.config;
    Json(PlansResponse {
        plans: config.plans().into_iter().copied().collect(),
        yearly_savings: config.yearly.savings_against(&config.monthly),
    })
}

/// GET /status
pub async fn status<R>(
    State(state): State<BillingAppState<R>>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse
where
    R: SubscriptionStore + Send + Sync + 'static,
{
    let status = CheckSubscriptionUseCase::new(state.repo.clone())
        .execute(&user.user_id)
        .await;
    Json(status)
}

/// POST /promo/validate
pub async fn validate_promo<R>(
    State(state): State<BillingAppState<R>>,
    Extension(_user): Extension<CurrentUser>,
    Json(req): Json<PromoValidateRequest>,
) -> BillingResult<Json<PromoValidateResponse>>
where
    R: SubscriptionStore + Send + Sync + 'static,
{
    let validation = ValidatePromoUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&req.code)
        .await?;
    let quote = req
        .plan_type
        .filter(|_| validation.valid)
        .map(|p| quote(state.config.plan(p), Some(&validation)));

    Ok(Json(PromoValidateResponse { validation, quote }))
}

/// POST /subscribe
pub async fn subscribe<R>(
    State(state): State<BillingAppState<R>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SubscribeRequest>,
) -> BillingResult<impl IntoResponse>
where
    R: SubscriptionStore + Send + Sync + 'static,
{
    let plan_type: PlanType = req.plan_type.parse()?;
    let output = SubscribeUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    )
    .execute(
        &user.user_id,
        SubscribeInput {
            plan_type,
            promo_code: req.promo_code,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(output)))
}
