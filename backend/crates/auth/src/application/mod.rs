//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod in_flight;
pub mod lockout;
pub mod oauth;
pub mod onboarding;
pub mod session_events;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use check_session::{CheckSessionUseCase, SessionIssuer};
pub use config::AuthConfig;
pub use lockout::{LockoutStatus, LockoutTracker};
pub use oauth::OAuthUseCase;
pub use onboarding::{OnboardingForm, OnboardingUseCase};
pub use session_events::{AuthEventKind, NavState, SessionBroadcast};
pub use sign_in::{ClientFingerprint, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpUseCase, SignupFlow, SignupFlows, SignupView};
