//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::onboarding::PostAuthRoute;

// ============================================================================
// Login
// ============================================================================

/// Login request (three factors)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// `@` prefix optional
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub route: PostAuthRoute,
    pub redirect_to: &'static str,
    pub email: Option<String>,
}

// ============================================================================
// Signup
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupStartRequest {
    /// Continue a provider sign-in at step 3
    #[serde(default)]
    pub from_oauth: bool,
}

/// Step 1
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub full_name: String,
    pub store_name: String,
}

/// Step 2
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
}

/// Step 3
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRequest {
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
}

/// Step 4
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[serde(default)]
    pub shop_type: String,
    pub store_name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub promo_code: String,
}

/// Signup or onboarding completed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedResponse {
    /// `@handle`, needed for every later login
    pub username: String,
    pub redirect_to: &'static str,
}

// ============================================================================
// Onboarding
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
    #[serde(default)]
    pub shop_type: String,
    pub shop_name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub promo_code: String,
}

// ============================================================================
// OAuth
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    /// Set by the provider when the owner cancels
    pub error: Option<String>,
}

// ============================================================================
// Live hints
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernamePreviewQuery {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub birth_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernamePreviewResponse {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordStrengthRequest {
    pub password: String,
}
