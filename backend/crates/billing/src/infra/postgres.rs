//! PostgreSQL Repository Implementation
//!
//! Active-subscription and promo checks go through the database procedures
//! shared with the storefront; inserts hit `subscriptions` directly.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{NewSubscription, PromoValidation, Subscription};
use crate::domain::repository::SubscriptionStore;
use crate::domain::value_objects::{PlanType, PromoCode};
use crate::error::{BillingError, BillingResult};
use kernel::id::{SubscriptionId, UserId};

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SubscriptionStore for PgSubscriptionStore {
    async fn has_active_subscription(&self, user_id: &UserId) -> BillingResult<bool> {
        let active: Option<bool> = sqlx::query_scalar("SELECT has_active_subscription($1)")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(active.unwrap_or(false))
    }

    async fn get_active_subscription(
        &self,
        user_id: &UserId,
    ) -> BillingResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT
                id,
                user_id,
                plan_type,
                amount::bigint AS amount,
                promo_code,
                discount_amount::bigint AS discount_amount,
                final_amount::bigint AS final_amount,
                expires_at,
                is_active
            FROM get_active_subscription($1)
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubscriptionRow::into_subscription).transpose()
    }

    async fn validate_promo_code(
        &self,
        code: &PromoCode,
    ) -> BillingResult<Option<PromoValidation>> {
        let row = sqlx::query_as::<_, PromoRow>(
            r#"
            SELECT
                valid,
                message,
                COALESCE(discount_percent, 0)::bigint AS discount_percent,
                COALESCE(discount_amount, 0)::bigint AS discount_amount,
                COALESCE(free_days, 0)::bigint AS free_days
            FROM validate_promo_code($1)
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PromoValidation {
            valid: r.valid.unwrap_or(false),
            message: r.message,
            discount_percent: r.discount_percent,
            discount_amount: r.discount_amount,
            free_days: r.free_days,
        }))
    }

    async fn increment_promo_usage(&self, code: &PromoCode) -> BillingResult<()> {
        sqlx::query("SELECT increment_promo_usage($1)")
            .bind(code.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_subscription(&self, sub: &NewSubscription) -> BillingResult<Subscription> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (
                user_id,
                plan_type,
                amount,
                promo_code,
                discount_amount,
                final_amount,
                expires_at,
                is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, true)
            RETURNING
                id,
                user_id,
                plan_type,
                amount::bigint AS amount,
                promo_code,
                discount_amount::bigint AS discount_amount,
                final_amount::bigint AS final_amount,
                expires_at,
                is_active
            "#,
        )
        .bind(sub.user_id.as_uuid())
        .bind(sub.plan_type.to_string())
        .bind(sub.amount)
        .bind(sub.promo_code.as_ref().map(PromoCode::as_str))
        .bind(sub.discount_amount)
        .bind(sub.final_amount)
        .bind(sub.expires_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_subscription()
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_type: String,
    amount: i64,
    promo_code: Option<String>,
    discount_amount: i64,
    final_amount: i64,
    expires_at: DateTime<Utc>,
    is_active: bool,
}

impl SubscriptionRow {
    fn into_subscription(self) -> BillingResult<Subscription> {
        let plan_type: PlanType = self.plan_type.parse().map_err(|_| {
            BillingError::Internal(format!("stored plan_type {:?}", self.plan_type))
        })?;
        Ok(Subscription {
            id: SubscriptionId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            plan_type,
            amount: self.amount,
            promo_code: self.promo_code,
            discount_amount: self.discount_amount,
            final_amount: self.final_amount,
            expires_at: self.expires_at,
            is_active: self.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PromoRow {
    valid: Option<bool>,
    message: Option<String>,
    discount_percent: i64,
    discount_amount: i64,
    free_days: i64,
}
