//! Sign Up Use Case
//!
//! The four-step signup machine. A [`SignupFlow`] is held in memory by
//! [`SignupFlows`] and addressed by a signed cookie; every transition runs
//! with the flow's mutex held, taken with `try_lock` so a second request on
//! the same flow is rejected instead of queued.
//!
//! ```text
//! 1 CollectCredentials --send_otp--> 2 VerifyOtp --verify_otp--> 3 PersonalDetails
//!   --go_step4--> 4 ShopDetails --finalize--> Finalized
//! back: 2→1, 3→2, 4→3 (fields kept)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use platform::clock::Clock;
use platform::countdown::Countdown;
use platform::password::ClearTextPassword;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::application::check_session::SessionIssuer;
use crate::application::config::AuthConfig;
use crate::application::session_events::{AuthEventKind, SessionBroadcast};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::profile::NewProfile;
use crate::domain::entity::signup_draft::{SignupDraft, SignupStep};
use crate::domain::onboarding::PostAuthRoute;
use crate::domain::repository::{AuthGateway, AuthStore, ProfileStore};
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::Username};
use crate::error::{AuthError, AuthResult};
use kernel::id::SignupFlowId;

/// One signup in progress
#[derive(Debug)]
pub struct SignupFlow {
    pub id: SignupFlowId,
    pub step: SignupStep,
    pub draft: SignupDraft,
    /// Message from the last failed transition
    pub error: Option<String>,
    /// Entered from an identity provider (starts at step 3)
    pub from_oauth: bool,
    resend: Option<Countdown>,
    touched_at_ms: i64,
}

impl SignupFlow {
    pub fn new(now_ms: i64) -> Self {
        Self {
            id: SignupFlowId::new(),
            step: SignupStep::CollectCredentials,
            draft: SignupDraft::default(),
            error: None,
            from_oauth: false,
            resend: None,
            touched_at_ms: now_ms,
        }
    }

    /// Email and name come from the identity claims
    pub fn from_identity(email: Option<String>, full_name: Option<String>, now_ms: i64) -> Self {
        Self {
            step: SignupStep::PersonalDetails,
            draft: SignupDraft::from_identity(email, full_name),
            from_oauth: true,
            ..Self::new(now_ms)
        }
    }

    pub fn resend_remaining_secs(&self) -> u64 {
        self.resend.as_ref().map_or(0, Countdown::remaining_secs)
    }

    /// Resend cooldown ticks, if one is running
    pub fn resend_countdown(&self) -> Option<tokio::sync::watch::Receiver<u64>> {
        self.resend.as_ref().map(Countdown::subscribe)
    }

    pub fn idle_since_ms(&self) -> i64 {
        self.touched_at_ms
    }

    /// `n → n−1` for steps 2 to 4
    pub fn back(&mut self) -> AuthResult<()> {
        let previous = self.step.previous().ok_or(AuthError::WrongStep)?;
        self.step = previous;
        self.error = None;
        Ok(())
    }

    fn begin(&mut self, expected: SignupStep, now_ms: i64) -> AuthResult<()> {
        if self.step != expected {
            return Err(AuthError::WrongStep);
        }
        self.error = None;
        self.touched_at_ms = now_ms;
        Ok(())
    }

    /// Record the failure message and hand the error back
    fn fail(&mut self, err: AuthError) -> AuthError {
        self.error = Some(err.to_string());
        err
    }

    pub fn view(&self) -> SignupView {
        let d = &self.draft;
        SignupView {
            step: self.step,
            step_number: self.step.number(),
            email: d.email.clone(),
            full_name: d.full_name.clone(),
            store_name: d.store_name.clone(),
            birth_date: d.birth_date.clone(),
            phone: d.phone.clone(),
            shop_type: d.shop_type.clone(),
            source: d.source.clone(),
            promo_code: d.promo_code.clone(),
            error: self.error.clone(),
            resend_secs: self.resend_remaining_secs(),
            from_oauth: self.from_oauth,
            username_preview: (self.step == SignupStep::ShopDetails).then(|| {
                Username::derive(&d.full_name, &d.store_name, &d.birth_date).to_string()
            }),
        }
    }
}

/// Flow state as rendered by the signup page (never the password)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupView {
    pub step: SignupStep,
    pub step_number: u8,
    pub email: String,
    pub full_name: String,
    pub store_name: String,
    pub birth_date: String,
    pub phone: String,
    pub shop_type: String,
    pub source: String,
    pub promo_code: String,
    pub error: Option<String>,
    pub resend_secs: u64,
    pub from_oauth: bool,
    pub username_preview: Option<String>,
}

/// In-memory registry of signup flows
#[derive(Debug, Clone, Default)]
pub struct SignupFlows {
    inner: Arc<RwLock<HashMap<SignupFlowId, Arc<Mutex<SignupFlow>>>>>,
}

impl SignupFlows {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, flow: SignupFlow) -> SignupFlowId {
        let id = flow.id;
        self.inner
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(flow)));
        id
    }

    /// Exclusive access for a transition; a held flow is `Busy`
    pub async fn acquire(&self, id: &SignupFlowId) -> AuthResult<OwnedMutexGuard<SignupFlow>> {
        let flow = self.get(id).await?;
        flow.try_lock_owned().map_err(|_| AuthError::Busy)
    }

    /// Waits for a pending transition; used for read-only views
    pub async fn read(&self, id: &SignupFlowId) -> AuthResult<OwnedMutexGuard<SignupFlow>> {
        let flow = self.get(id).await?;
        Ok(flow.lock_owned().await)
    }

    async fn get(&self, id: &SignupFlowId) -> AuthResult<Arc<Mutex<SignupFlow>>> {
        self.inner
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AuthError::FlowNotFound)
    }

    pub async fn remove(&self, id: &SignupFlowId) {
        self.inner.write().await.remove(id);
    }

    /// Drop flows idle for longer than `ttl_ms`; busy flows are kept
    pub async fn purge_idle(&self, now_ms: i64, ttl_ms: i64) -> usize {
        let mut flows = self.inner.write().await;
        let before = flows.len();
        flows.retain(|_, flow| match flow.try_lock() {
            Ok(flow) => now_ms.saturating_sub(flow.idle_since_ms()) < ttl_ms,
            Err(_) => true,
        });
        before - flows.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Step 1 form
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub full_name: String,
    pub store_name: String,
}

/// Step 3 form
pub struct PersonalInput {
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
}

/// Step 4 form
pub struct ShopInput {
    pub shop_type: String,
    pub store_name: String,
    pub source: String,
    pub promo_code: String,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub session: AuthSession,
    pub session_token: String,
}

#[derive(Debug)]
pub struct FinalizeOutput {
    pub username: Username,
    pub route: PostAuthRoute,
}

/// Sign up use case
pub struct SignUpUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    sessions: SessionIssuer<R>,
    events: SessionBroadcast,
}

impl<R, G> SignUpUseCase<R, G>
where
    R: AuthStore,
    G: AuthGateway + Send + Sync,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
        key: platform::crypto::SigningKey,
        events: SessionBroadcast,
    ) -> Self {
        Self {
            sessions: SessionIssuer::new(repo.clone(), config.clone(), key, clock.clone()),
            repo,
            gateway,
            config,
            clock,
            events,
        }
    }

    /// 1 → 2: validate, mail the code, start the resend cooldown
    pub async fn send_otp(&self, flow: &mut SignupFlow, input: CredentialsInput) -> AuthResult<()> {
        flow.begin(SignupStep::CollectCredentials, self.clock.now_ms())?;

        let draft = &mut flow.draft;
        draft.email = input.email.trim().to_string();
        draft.password = Some(ClearTextPassword::new(input.password));
        draft.confirm = Some(ClearTextPassword::new(input.confirm));
        draft.full_name = input.full_name;
        draft.store_name = input.store_name;

        let email = match flow.draft.check_credentials() {
            Ok(email) => email,
            Err(e) => return Err(flow.fail(e.into())),
        };

        if let Err(e) = self.gateway.send_otp(&email, true).await {
            tracing::warn!(error = %e, flow_id = %flow.id, "Sending signup code failed");
            return Err(flow.fail(e));
        }

        flow.resend = Some(Countdown::start(self.config.resend_cooldown));
        flow.step = SignupStep::VerifyOtp;
        tracing::info!(flow_id = %flow.id, email_domain = email.domain(), "Signup code sent");
        Ok(())
    }

    /// In 2, only once the cooldown is over
    pub async fn resend_otp(&self, flow: &mut SignupFlow) -> AuthResult<()> {
        flow.begin(SignupStep::VerifyOtp, self.clock.now_ms())?;

        let remaining_secs = flow.resend_remaining_secs();
        if remaining_secs > 0 {
            return Err(flow.fail(AuthError::ResendCooldown { remaining_secs }));
        }

        let email = Email::from_trusted(flow.draft.email.to_lowercase());
        if let Err(e) = self.gateway.send_otp(&email, true).await {
            return Err(flow.fail(e));
        }

        flow.resend = Some(Countdown::start(self.config.resend_cooldown));
        tracing::info!(flow_id = %flow.id, "Signup code resent");
        Ok(())
    }

    /// 2 → 3: the provider confirms the code and opens a session
    pub async fn verify_otp(
        &self,
        flow: &mut SignupFlow,
        otp: String,
        device_key: &str,
    ) -> AuthResult<VerifyOtpOutput> {
        flow.begin(SignupStep::VerifyOtp, self.clock.now_ms())?;
        flow.draft.otp = otp.trim().to_string();

        let code = match flow.draft.check_otp() {
            Ok(code) => code,
            Err(e) => return Err(flow.fail(e.into())),
        };
        let email = Email::from_trusted(flow.draft.email.to_lowercase());

        let provider = match self.gateway.verify_otp(&email, &code).await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::debug!(error = %e, flow_id = %flow.id, "Code verification failed");
                return Err(flow.fail(AuthError::OtpInvalid));
            }
        };

        let access_token = provider.access_token.clone();
        let (session, session_token) = match self.sessions.issue(provider).await {
            Ok(issued) => issued,
            Err(e) => return Err(flow.fail(e)),
        };

        // the chosen password stays in the draft until a session exists
        if let Some(password) = flow.draft.password.take().filter(|p| !p.is_empty()) {
            if let Err(e) = self.gateway.update_password(&access_token, &password).await {
                tracing::warn!(error = %e, flow_id = %flow.id, "Setting password after verification failed");
            }
        }
        flow.draft.confirm = None;
        self.events.publish(AuthEventKind::SignedIn, device_key);

        flow.resend = None;
        flow.step = SignupStep::PersonalDetails;
        tracing::info!(flow_id = %flow.id, user_id = %session.user_id, "Signup email verified");

        Ok(VerifyOtpOutput {
            session,
            session_token,
        })
    }

    /// 3 → 4: local checks only
    pub fn go_step4(&self, flow: &mut SignupFlow, input: PersonalInput) -> AuthResult<()> {
        flow.begin(SignupStep::PersonalDetails, self.clock.now_ms())?;

        flow.draft.full_name = input.full_name;
        flow.draft.birth_date = input.birth_date.trim().to_string();
        flow.draft.set_phone(&input.phone);

        if let Err(e) = flow.draft.check_personal(self.clock.current_year()) {
            return Err(flow.fail(e.into()));
        }
        flow.step = SignupStep::ShopDetails;
        Ok(())
    }

    /// 4 → Finalized: one profile upsert keyed by the signed-in user
    ///
    /// A write failure keeps the flow at step 4 with everything entered.
    pub async fn finalize(
        &self,
        flow: &mut SignupFlow,
        input: ShopInput,
        user_id: Option<UserId>,
    ) -> AuthResult<FinalizeOutput> {
        flow.begin(SignupStep::ShopDetails, self.clock.now_ms())?;

        let draft = &mut flow.draft;
        draft.shop_type = input.shop_type.trim().to_string();
        draft.store_name = input.store_name;
        draft.source = input.source.trim().to_string();
        draft.promo_code = input.promo_code;

        if let Err(e) = flow.draft.check_shop() {
            return Err(flow.fail(e.into()));
        }
        let Some(user_id) = user_id else {
            return Err(flow.fail(AuthError::UserMissing));
        };

        let profile = match flow.draft.to_new_profile(user_id, self.clock.current_year()) {
            Ok(profile) => profile,
            Err(e) => return Err(flow.fail(e.into())),
        };
        let profile = match save_profile(self.repo.as_ref(), profile).await {
            Ok(profile) => profile,
            Err(e) => return Err(flow.fail(e)),
        };

        flow.step = SignupStep::Finalized;
        tracing::info!(
            flow_id = %flow.id,
            user_id = %user_id,
            shop_type = %profile.shop_type,
            "Signup finalized"
        );

        Ok(FinalizeOutput {
            username: profile.username,
            route: PostAuthRoute::Root,
        })
    }
}

/// Upsert that keeps a username already on record
///
/// The returned profile carries the username the row ends up with. When the
/// lookup before the write fails, the row is read back after it.
pub(crate) async fn save_profile<R>(repo: &R, profile: NewProfile) -> AuthResult<NewProfile>
where
    R: ProfileStore,
{
    let user_id = profile.id;
    let (profile, confirmed) = match repo.find_profile(&user_id).await {
        Ok(existing) => (profile.keep_username(existing.and_then(|p| p.username())), true),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user_id, "Existing profile lookup failed");
            (profile, false)
        }
    };

    repo.upsert_profile(&profile)
        .await
        .map_err(|e| AuthError::ProfileSave(save_error_message(&e)))?;
    if confirmed {
        return Ok(profile);
    }

    let stored = repo
        .find_profile(&user_id)
        .await?
        .and_then(|p| p.username())
        .ok_or_else(|| AuthError::Internal("profile missing after save".to_string()))?;
    Ok(profile.keep_username(Some(stored)))
}

/// Database message without the wrapper text
pub(crate) fn save_error_message(err: &AuthError) -> String {
    match err {
        AuthError::Database(db) => db
            .as_database_error()
            .map(|d| d.message().to_string())
            .unwrap_or_else(|| db.to_string()),
        other => other.to_string(),
    }
}
