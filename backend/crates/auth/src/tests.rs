//! Crate-level tests for the auth flows
//!
//! Use cases run against [`MemoryAuthStore`] and a scripted auth provider;
//! router tests drive the axum app with `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod fakes {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use platform::client::{ClientFingerprint, DeviceId};
    use platform::clock::ManualClock;
    use platform::crypto::SigningKey;
    use platform::password::ClearTextPassword;

    use crate::application::config::AuthConfig;
    use crate::application::in_flight::InFlight;
    use crate::application::{
        OAuthUseCase, OnboardingUseCase, SessionBroadcast, SignInUseCase, SignUpUseCase,
    };
    use crate::domain::entity::{
        auth_session::AuthSession,
        login_attempt::LoginAttemptState,
        profile::{NewProfile, Profile},
    };
    use crate::domain::repository::{
        AuthGateway, AuthStore, LoginMetaStore, ProfileStore, ProviderSession, ProviderUser,
        SessionStore,
    };
    use crate::domain::value_object::{
        email::Email, oauth_provider::OAuthProvider, otp_code::OtpCode, user_id::UserId,
    };
    use crate::error::{AuthError, AuthResult};
    use crate::infra::MemoryAuthStore;
    use kernel::id::SessionId;

    /// 2025-06-01T00:00:00Z
    pub const NOW_MS: i64 = 1_748_736_000_000;
    pub const OTP: &str = "123456";
    pub const OAUTH_CODE: &str = "good-code";
    pub const OAUTH_EMAIL: &str = "google.user@gmail.com";
    pub const USER_AGENT: &str = "Mozilla/5.0 (test)";

    pub fn provider_session(id: UserId, email: &str, display_name: Option<&str>) -> ProviderSession {
        ProviderSession {
            access_token: format!("at-{id}"),
            refresh_token: Some(format!("rt-{id}")),
            expires_in: Some(3600),
            user: ProviderUser {
                id,
                email: Some(email.to_string()),
                display_name: display_name.map(str::to_string),
            },
        }
    }

    /// Scripted auth provider
    #[derive(Default)]
    pub struct FakeGateway {
        accounts: Mutex<HashMap<String, (String, UserId)>>,
        pending: Mutex<HashMap<String, UserId>>,
        pub oauth_user: Mutex<Option<UserId>>,
        pub fail_send: AtomicBool,
        pub sign_in_calls: AtomicUsize,
        pub sign_out_calls: AtomicUsize,
        pub otp_sent: AtomicUsize,
        pub password_updates: AtomicUsize,
    }

    impl FakeGateway {
        pub fn with_account(self, email: &str, password: &str, id: UserId) -> Self {
            self.add_account(email, password, id);
            self
        }

        pub fn add_account(&self, email: &str, password: &str, id: UserId) {
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), (password.to_string(), id));
        }

        pub fn count(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    fn rejected(message: &str) -> AuthError {
        AuthError::Provider {
            status: 400,
            message: message.to_string(),
        }
    }

    impl AuthGateway for FakeGateway {
        async fn sign_in_with_password(
            &self,
            email: &Email,
            password: &str,
        ) -> AuthResult<ProviderSession> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            let account = self.accounts.lock().unwrap().get(email.as_str()).cloned();
            match account {
                Some((expected, id)) if expected == password => {
                    Ok(provider_session(id, email.as_str(), None))
                }
                _ => Err(rejected("Invalid login credentials")),
            }
        }

        async fn send_otp(&self, email: &Email, create_user: bool) -> AuthResult<()> {
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(AuthError::Provider {
                    status: 429,
                    message: "Email rate limit exceeded".to_string(),
                });
            }
            assert!(create_user);
            self.otp_sent.fetch_add(1, Ordering::SeqCst);
            self.pending
                .lock()
                .unwrap()
                .entry(email.as_str().to_string())
                .or_insert_with(UserId::new);
            Ok(())
        }

        async fn verify_otp(&self, email: &Email, code: &OtpCode) -> AuthResult<ProviderSession> {
            let id = self.pending.lock().unwrap().get(email.as_str()).copied();
            match id {
                Some(id) if code.as_str() == OTP => Ok(provider_session(id, email.as_str(), None)),
                _ => Err(rejected("Token has expired or is invalid")),
            }
        }

        async fn update_password(
            &self,
            _access_token: &str,
            password: &ClearTextPassword,
        ) -> AuthResult<()> {
            assert!(!password.is_empty());
            self.password_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn authorize_url(
            &self,
            provider: OAuthProvider,
            redirect_to: &str,
            code_challenge: &str,
        ) -> String {
            format!(
                "https://auth.test/authorize?provider={provider}&redirect_to={redirect_to}&code_challenge={code_challenge}"
            )
        }

        async fn exchange_code(
            &self,
            code: &str,
            _code_verifier: &str,
        ) -> AuthResult<ProviderSession> {
            if code != OAUTH_CODE {
                return Err(rejected("invalid flow state"));
            }
            let id = *self.oauth_user.lock().unwrap().get_or_insert_with(UserId::new);
            Ok(provider_session(id, OAUTH_EMAIL, Some("Ali Valiyev")))
        }

        async fn get_user(&self, _access_token: &str) -> AuthResult<ProviderUser> {
            Err(AuthError::Provider {
                status: 401,
                message: "invalid JWT".to_string(),
            })
        }

        async fn sign_out(&self, _access_token: &str) -> AuthResult<()> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Memory store whose profile writes, lookups and session writes can be
    /// made to fail
    #[derive(Debug, Clone, Default)]
    pub struct FlakyStore {
        pub inner: MemoryAuthStore,
        pub fail_upsert: Arc<AtomicBool>,
        /// Number of upcoming profile lookups that fail
        pub failing_finds: Arc<AtomicUsize>,
        /// Number of upcoming session writes that fail
        pub failing_sessions: Arc<AtomicUsize>,
    }

    impl FlakyStore {
        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl ProfileStore for FlakyStore {
        async fn find_profile(&self, user_id: &UserId) -> AuthResult<Option<Profile>> {
            if Self::take_failure(&self.failing_finds) {
                return Err(AuthError::Internal("profiles read timed out".to_string()));
            }
            self.inner.find_profile(user_id).await
        }

        async fn upsert_profile(&self, profile: &NewProfile) -> AuthResult<()> {
            if self.fail_upsert.load(Ordering::SeqCst) {
                return Err(AuthError::Internal("profiles write rejected".to_string()));
            }
            self.inner.upsert_profile(profile).await
        }
    }

    impl LoginMetaStore for FlakyStore {
        async fn load_login_meta(&self, key: &str) -> AuthResult<LoginAttemptState> {
            self.inner.load_login_meta(key).await
        }

        async fn save_login_meta(&self, key: &str, state: &LoginAttemptState) -> AuthResult<()> {
            self.inner.save_login_meta(key, state).await
        }

        async fn clear_login_meta(&self, key: &str) -> AuthResult<()> {
            self.inner.clear_login_meta(key).await
        }
    }

    impl SessionStore for FlakyStore {
        async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
            if Self::take_failure(&self.failing_sessions) {
                return Err(AuthError::Internal("sessions write rejected".to_string()));
            }
            self.inner.create_session(session).await
        }

        async fn find_session(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>> {
            self.inner.find_session(session_id).await
        }

        async fn delete_session(&self, session_id: &SessionId) -> AuthResult<()> {
            self.inner.delete_session(session_id).await
        }

        async fn purge_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
            self.inner.purge_expired_sessions(now_ms).await
        }
    }

    pub fn complete_profile(id: UserId) -> Profile {
        Profile {
            username: Some("alimarket1495".to_string()),
            full_name: Some("Ali Valiyev".to_string()),
            phone: Some("+998 90 123 45 67".to_string()),
            birth_date: Some("1995-07-14".to_string()),
            shop_name: Some("Mega Market".to_string()),
            shop_type: Some("oziq-ovqat".to_string()),
            ..Profile::empty(id)
        }
    }

    pub const DEVICE: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f0";

    pub fn fingerprint() -> ClientFingerprint {
        fingerprint_for(DEVICE)
    }

    pub fn fingerprint_for(device: &str) -> ClientFingerprint {
        let device = DeviceId::parse(device).expect("test device id is well formed");
        ClientFingerprint::new(device, None)
    }

    /// Use cases wired to shared fakes
    pub struct Harness<R: AuthStore> {
        pub repo: Arc<R>,
        pub gateway: Arc<FakeGateway>,
        pub config: Arc<AuthConfig>,
        pub clock: ManualClock,
        pub key: SigningKey,
        pub events: SessionBroadcast,
        pub in_flight: InFlight,
    }

    impl Harness<MemoryAuthStore> {
        pub fn new() -> Self {
            Self::with_store(MemoryAuthStore::new(), FakeGateway::default())
        }
    }

    impl<R: AuthStore> Harness<R> {
        pub fn with_store(repo: R, gateway: FakeGateway) -> Self {
            let config = AuthConfig::development();
            let key = SigningKey::new(&config.session_secret).unwrap();
            Self {
                repo: Arc::new(repo),
                gateway: Arc::new(gateway),
                config: Arc::new(config),
                clock: ManualClock::at(NOW_MS),
                key,
                events: SessionBroadcast::new(),
                in_flight: InFlight::new(),
            }
        }

        pub fn sign_in(&self) -> SignInUseCase<R, FakeGateway> {
            SignInUseCase::new(
                self.repo.clone(),
                self.gateway.clone(),
                self.config.clone(),
                Arc::new(self.clock.clone()),
                self.key.clone(),
                self.events.clone(),
                self.in_flight.clone(),
            )
        }

        pub fn sign_up(&self) -> SignUpUseCase<R, FakeGateway> {
            SignUpUseCase::new(
                self.repo.clone(),
                self.gateway.clone(),
                self.config.clone(),
                Arc::new(self.clock.clone()),
                self.key.clone(),
                self.events.clone(),
            )
        }

        pub fn onboarding(&self) -> OnboardingUseCase<R> {
            OnboardingUseCase::new(self.repo.clone(), Arc::new(self.clock.clone()))
        }

        pub fn oauth(&self) -> OAuthUseCase<R, FakeGateway> {
            OAuthUseCase::new(
                self.repo.clone(),
                self.gateway.clone(),
                self.config.clone(),
                Arc::new(self.clock.clone()),
                self.key.clone(),
                self.events.clone(),
            )
        }
    }
}

#[cfg(test)]
mod sign_in_tests {
    use super::fakes::*;
    use crate::application::lockout::LockoutTracker;
    use crate::application::{AuthEventKind, SignInInput};
    use crate::domain::entity::profile::Profile;
    use crate::domain::onboarding::PostAuthRoute;
    use crate::domain::repository::ProfileStore;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;
    use crate::infra::MemoryAuthStore;

    const EMAIL: &str = "ali@mail.uz";
    const PASSWORD: &str = "secret1";

    async fn owner() -> (Harness<MemoryAuthStore>, UserId) {
        let id = UserId::new();
        let h = Harness::with_store(
            MemoryAuthStore::new(),
            FakeGateway::default().with_account(EMAIL, PASSWORD, id),
        );
        h.repo.put_profile(complete_profile(id)).await;
        (h, id)
    }

    fn input(username: &str, password: &str) -> SignInInput {
        SignInInput {
            username: username.to_string(),
            email: EMAIL.to_string(),
            password: password.to_string(),
        }
    }

    fn tracker(h: &Harness<MemoryAuthStore>) -> LockoutTracker<MemoryAuthStore> {
        LockoutTracker::new(
            h.repo.clone(),
            h.config.lockout,
            std::sync::Arc::new(h.clock.clone()),
        )
    }

    #[tokio::test]
    async fn test_success_opens_session_and_notifies() {
        let (h, id) = owner().await;
        let mut events = h.events.subscribe();

        let out = h
            .sign_in()
            .execute(input(" @AliMarket1495 ", PASSWORD), &fingerprint())
            .await
            .unwrap();

        assert_eq!(out.route, PostAuthRoute::Root);
        assert_eq!(out.session.user_id, id);
        assert_eq!(h.repo.session_count().await, 1);
        assert!(out.session_token.contains('.'));

        let event = events.try_recv().unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.device_key, fingerprint().device_key());
    }

    #[tokio::test]
    async fn test_incomplete_profile_routes_to_onboarding() {
        let (h, id) = owner().await;
        let mut profile = complete_profile(id);
        profile.shop_type = None;
        h.repo.put_profile(profile).await;

        let out = h
            .sign_in()
            .execute(input("alimarket1495", PASSWORD), &fingerprint())
            .await
            .unwrap();
        assert_eq!(out.route, PostAuthRoute::Onboarding);
    }

    #[tokio::test]
    async fn test_five_failures_lock_before_network() {
        let (h, _) = owner().await;
        let fp = fingerprint();

        for attempt in 1..=5u32 {
            let err = h
                .sign_in()
                .execute(input("alimarket1495", "wrong-pass"), &fp)
                .await
                .unwrap_err();
            match err {
                AuthError::CountedFailure {
                    cause,
                    attempts_left,
                    locked_for_secs,
                } => {
                    assert!(matches!(*cause, AuthError::InvalidCredentials));
                    assert_eq!(attempts_left, 5 - attempt);
                    assert_eq!(locked_for_secs.is_some(), attempt == 5);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(FakeGateway::count(&h.gateway.sign_in_calls), 5);

        // the right password is not even sent while locked
        let err = h
            .sign_in()
            .execute(input("alimarket1495", PASSWORD), &fp)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Locked { remaining_secs: 120 }));
        assert_eq!(FakeGateway::count(&h.gateway.sign_in_calls), 5);

        // remaining time is non-increasing and reaches 0 at the deadline
        let mut last = u64::MAX;
        for _ in 0..12 {
            h.clock.advance_ms(10_000);
            let status = tracker(&h).status(&fp.device_key()).await.unwrap();
            assert!(status.remaining_secs <= last);
            last = status.remaining_secs;
        }
        assert_eq!(last, 0);

        let out = h
            .sign_in()
            .execute(input("alimarket1495", PASSWORD), &fp)
            .await;
        assert!(out.is_ok());
    }

    #[tokio::test]
    async fn test_devices_sharing_a_user_agent_lock_independently() {
        let (h, _) = owner().await;
        let victim_id = UserId::new();
        h.gateway.add_account("vali@mail.uz", "secret2", victim_id);
        h.repo.put_profile(Profile {
            username: Some("valishop0101".to_string()),
            ..complete_profile(victim_id)
        })
        .await;

        let attacker = fingerprint();
        let victim = fingerprint_for("aaaaaaaaaaaaaaaabbbbbbbbbbbbbbbb");
        for _ in 0..5 {
            let _ = h
                .sign_in()
                .execute(input("alimarket1495", "wrong-pass"), &attacker)
                .await;
        }
        assert!(tracker(&h).status(&attacker.device_key()).await.unwrap().locked);

        let out = h
            .sign_in()
            .execute(
                SignInInput {
                    username: "valishop0101".to_string(),
                    email: "vali@mail.uz".to_string(),
                    password: "secret2".to_string(),
                },
                &victim,
            )
            .await
            .unwrap();
        assert_eq!(out.session.user_id, victim_id);

        let status = tracker(&h).status(&victim.device_key()).await.unwrap();
        assert!(!status.locked);
        assert_eq!(status.attempts, 0);
    }

    #[tokio::test]
    async fn test_expired_lock_in_storage_reads_as_open() {
        let (h, _) = owner().await;
        let fp = fingerprint();
        for _ in 0..5 {
            let _ = h
                .sign_in()
                .execute(input("alimarket1495", "wrong-pass"), &fp)
                .await;
        }
        h.clock.advance_ms(120_001);

        let status = tracker(&h).status(&fp.device_key()).await.unwrap();
        assert!(!status.locked);
        assert_eq!(status.attempts, 0);
        assert_eq!(status.attempts_left, 5);
    }

    #[tokio::test]
    async fn test_success_after_four_failures_resets() {
        let (h, _) = owner().await;
        let fp = fingerprint();
        for _ in 0..4 {
            let _ = h
                .sign_in()
                .execute(input("alimarket1495", "wrong-pass"), &fp)
                .await;
        }
        assert_eq!(
            tracker(&h).status(&fp.device_key()).await.unwrap().attempts,
            4
        );

        h.sign_in()
            .execute(input("alimarket1495", PASSWORD), &fp)
            .await
            .unwrap();

        let status = tracker(&h).status(&fp.device_key()).await.unwrap();
        assert_eq!(status.attempts, 0);
        assert!(!status.locked);
        assert_eq!(status.remaining_secs, 0);
    }

    #[tokio::test]
    async fn test_bad_shape_is_not_counted() {
        let (h, _) = owner().await;
        let fp = fingerprint();

        for bad in [input("al", PASSWORD), input("alimarket1495", "short")] {
            let err = h.sign_in().execute(bad, &fp).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)));
        }
        assert_eq!(FakeGateway::count(&h.gateway.sign_in_calls), 0);
        assert_eq!(
            tracker(&h).status(&fp.device_key()).await.unwrap().attempts,
            0
        );
    }

    #[tokio::test]
    async fn test_username_mismatch_revokes_provider_session() {
        let (h, _) = owner().await;
        let err = h
            .sign_in()
            .execute(input("@someone", PASSWORD), &fingerprint())
            .await
            .unwrap_err();

        let AuthError::CountedFailure { cause, .. } = err else {
            panic!("expected a counted failure");
        };
        assert!(matches!(*cause, AuthError::UsernameMismatch));
        assert_eq!(FakeGateway::count(&h.gateway.sign_out_calls), 1);
        assert_eq!(h.repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_and_missing_profiles() {
        let (h, id) = owner().await;
        let mut profile = complete_profile(id);
        profile.is_active = false;
        h.repo.put_profile(profile).await;

        let err = h
            .sign_in()
            .execute(input("alimarket1495", PASSWORD), &fingerprint())
            .await
            .unwrap_err();
        let AuthError::CountedFailure { cause, .. } = err else {
            panic!("expected a counted failure");
        };
        assert!(matches!(*cause, AuthError::AccountDisabled));

        let other = UserId::new();
        h.gateway.add_account("other@mail.uz", PASSWORD, other);
        assert!(h.repo.find_profile(&other).await.unwrap().is_none());
        let err = h
            .sign_in()
            .execute(
                crate::application::SignInInput {
                    username: "other".to_string(),
                    email: "other@mail.uz".to_string(),
                    password: PASSWORD.to_string(),
                },
                &fingerprint(),
            )
            .await
            .unwrap_err();
        let AuthError::CountedFailure { cause, .. } = err else {
            panic!("expected a counted failure");
        };
        assert!(matches!(*cause, AuthError::ProfileNotFound));
    }

    #[tokio::test]
    async fn test_second_submission_in_flight_is_busy() {
        let (h, _) = owner().await;
        let fp = fingerprint();
        let _held = h.in_flight.try_acquire(&fp.device_key()).unwrap();

        let err = h
            .sign_in()
            .execute(input("alimarket1495", PASSWORD), &fp)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Busy));
        assert_eq!(FakeGateway::count(&h.gateway.sign_in_calls), 0);
    }
}

#[cfg(test)]
mod sign_up_tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::fakes::*;
    use crate::application::SignupFlow;
    use crate::application::sign_up::{CredentialsInput, PersonalInput, ShopInput};
    use crate::domain::entity::signup_draft::SignupStep;
    use crate::domain::onboarding::PostAuthRoute;
    use crate::domain::repository::ProfileStore;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;

    fn credentials() -> CredentialsInput {
        CredentialsInput {
            email: "New@Mail.uz".to_string(),
            password: "Abcd1234".to_string(),
            confirm: "Abcd1234".to_string(),
            full_name: "Ali Valiyev".to_string(),
            store_name: "Mega Market".to_string(),
        }
    }

    fn personal() -> PersonalInput {
        PersonalInput {
            full_name: "Ali Valiyev".to_string(),
            birth_date: "1995-07-14".to_string(),
            phone: "901234567".to_string(),
        }
    }

    fn shop(shop_type: &str, promo_code: &str) -> ShopInput {
        ShopInput {
            shop_type: shop_type.to_string(),
            store_name: "Mega Market".to_string(),
            source: "telegram".to_string(),
            promo_code: promo_code.to_string(),
        }
    }

    /// A flow parked on step 4 with everything before it filled in
    fn at_shop_step() -> SignupFlow {
        let mut flow = SignupFlow::new(NOW_MS);
        flow.step = SignupStep::ShopDetails;
        flow.draft.email = "new@mail.uz".to_string();
        flow.draft.full_name = "Ali Valiyev".to_string();
        flow.draft.store_name = "Mega Market".to_string();
        flow.draft.birth_date = "1995-07-14".to_string();
        flow.draft.phone = "+998 90 123 45 67".to_string();
        flow
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_signup() {
        let h = Harness::new();
        let use_case = h.sign_up();
        let mut flow = SignupFlow::new(NOW_MS);

        use_case.send_otp(&mut flow, credentials()).await.unwrap();
        assert_eq!(flow.step, SignupStep::VerifyOtp);
        assert_eq!(flow.resend_remaining_secs(), 60);
        assert_eq!(FakeGateway::count(&h.gateway.otp_sent), 1);

        let verified = use_case
            .verify_otp(&mut flow, " 123456 ".to_string(), "device")
            .await
            .unwrap();
        assert_eq!(flow.step, SignupStep::PersonalDetails);
        assert!(flow.draft.password.is_none());
        assert!(flow.draft.confirm.is_none());
        assert_eq!(FakeGateway::count(&h.gateway.password_updates), 1);
        assert_eq!(flow.resend_remaining_secs(), 0);
        assert_eq!(h.repo.session_count().await, 1);

        use_case.go_step4(&mut flow, personal()).unwrap();
        assert_eq!(flow.step, SignupStep::ShopDetails);
        assert_eq!(flow.draft.phone, "+998 90 123 45 67");
        assert_eq!(
            flow.view().username_preview.as_deref(),
            Some("@alimarket1495")
        );

        let user_id = verified.session.user_id;
        let done = use_case
            .finalize(&mut flow, shop("oziq-ovqat", "START25"), Some(user_id))
            .await
            .unwrap();
        assert_eq!(done.username.as_str(), "alimarket1495");
        assert_eq!(done.route, PostAuthRoute::Root);
        assert_eq!(flow.step, SignupStep::Finalized);

        let stored = h.repo.find_profile(&user_id).await.unwrap().unwrap();
        assert!(stored.is_complete());
        assert_eq!(stored.shop_type.as_deref(), Some("oziq-ovqat"));
        assert_eq!(stored.source.as_deref(), Some("telegram"));
        assert_eq!(stored.promo_code.as_deref(), Some("START25"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credentials_stay_on_step_one() {
        let h = Harness::new();
        let mut flow = SignupFlow::new(NOW_MS);
        let mut input = credentials();
        input.confirm = "Abcd12345".to_string();

        let err = h.sign_up().send_otp(&mut flow, input).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(flow.step, SignupStep::CollectCredentials);
        assert_eq!(flow.error.as_deref(), Some("Passwords do not match"));
        assert_eq!(FakeGateway::count(&h.gateway.otp_sent), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_password_is_rejected_on_step_one() {
        let h = Harness::new();
        let mut flow = SignupFlow::new(NOW_MS);
        let mut input = credentials();
        input.password = "abc".to_string();
        input.confirm = "abc".to_string();

        let err = h.sign_up().send_otp(&mut flow, input).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(flow.step, SignupStep::CollectCredentials);
        assert_eq!(
            flow.error.as_deref(),
            Some("Password needs at least 8 characters, 1 uppercase letter and 1 digit")
        );
        assert_eq!(flow.resend_remaining_secs(), 0);
        assert_eq!(FakeGateway::count(&h.gateway.otp_sent), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimal_valid_credentials_reach_step_two() {
        let h = Harness::new();
        let mut flow = SignupFlow::new(NOW_MS);
        let input = CredentialsInput {
            email: "a@b.com".to_string(),
            password: "Abcd1234".to_string(),
            confirm: "Abcd1234".to_string(),
            full_name: "Ali Valiyev".to_string(),
            store_name: "Tech Shop".to_string(),
        };

        h.sign_up().send_otp(&mut flow, input).await.unwrap();
        assert_eq!(flow.step, SignupStep::VerifyOtp);
        assert_eq!(flow.error, None);
        assert_eq!(flow.resend_remaining_secs(), 60);
        assert_eq!(flow.draft.email, "a@b.com");
        assert_eq!(FakeGateway::count(&h.gateway.otp_sent), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_password_survives_failed_session_write() {
        let store = FlakyStore::default();
        store.failing_sessions.store(1, Ordering::SeqCst);
        let h = Harness::with_store(store, FakeGateway::default());
        let use_case = h.sign_up();
        let mut flow = SignupFlow::new(NOW_MS);
        use_case.send_otp(&mut flow, credentials()).await.unwrap();

        let err = use_case
            .verify_otp(&mut flow, OTP.to_string(), DEVICE)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert_eq!(flow.step, SignupStep::VerifyOtp);
        assert!(flow.draft.password.is_some());
        assert_eq!(FakeGateway::count(&h.gateway.password_updates), 0);

        use_case
            .verify_otp(&mut flow, OTP.to_string(), DEVICE)
            .await
            .unwrap();
        assert_eq!(flow.step, SignupStep::PersonalDetails);
        assert!(flow.draft.password.is_none());
        assert_eq!(FakeGateway::count(&h.gateway.password_updates), 1);
        assert_eq!(h.repo.inner.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_message_surfaces_on_send_failure() {
        let h = Harness::new();
        h.gateway.fail_send.store(true, Ordering::SeqCst);
        let mut flow = SignupFlow::new(NOW_MS);

        let err = h
            .sign_up()
            .send_otp(&mut flow, credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider { status: 429, .. }));
        assert_eq!(flow.step, SignupStep::CollectCredentials);
        assert_eq!(flow.error.as_deref(), Some("Email rate limit exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_waits_for_cooldown() {
        let h = Harness::new();
        let use_case = h.sign_up();
        let mut flow = SignupFlow::new(NOW_MS);
        use_case.send_otp(&mut flow, credentials()).await.unwrap();

        let err = use_case.resend_otp(&mut flow).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::ResendCooldown { remaining_secs: 60 }
        ));

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(flow.resend_remaining_secs(), 15);
        assert!(use_case.resend_otp(&mut flow).await.is_err());

        tokio::time::advance(Duration::from_secs(15)).await;
        use_case.resend_otp(&mut flow).await.unwrap();
        assert_eq!(FakeGateway::count(&h.gateway.otp_sent), 2);
        assert_eq!(flow.resend_remaining_secs(), 60);
        assert_eq!(flow.step, SignupStep::VerifyOtp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_or_malformed_code() {
        let h = Harness::new();
        let use_case = h.sign_up();
        let mut flow = SignupFlow::new(NOW_MS);
        use_case.send_otp(&mut flow, credentials()).await.unwrap();

        let err = use_case
            .verify_otp(&mut flow, "12ab".to_string(), "device")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = use_case
            .verify_otp(&mut flow, "000000".to_string(), "device")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpInvalid));
        assert_eq!(flow.step, SignupStep::VerifyOtp);
        assert_eq!(flow.error.as_deref(), Some("Code is wrong or expired"));
        assert!(flow.draft.password.is_some());
        assert_eq!(h.repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_transitions_only_from_their_step() {
        let h = Harness::new();
        let use_case = h.sign_up();
        let mut flow = SignupFlow::new(NOW_MS);

        assert!(matches!(
            use_case.go_step4(&mut flow, personal()),
            Err(AuthError::WrongStep)
        ));
        assert!(matches!(
            use_case.resend_otp(&mut flow).await,
            Err(AuthError::WrongStep)
        ));
        assert!(matches!(
            use_case
                .finalize(&mut flow, shop("kiyim", ""), Some(UserId::new()))
                .await,
            Err(AuthError::WrongStep)
        ));
        assert_eq!(flow.step, SignupStep::CollectCredentials);
    }

    #[tokio::test]
    async fn test_personal_details_rejected_in_order() {
        let h = Harness::new();
        let mut flow = SignupFlow::new(NOW_MS);
        flow.step = SignupStep::PersonalDetails;

        let mut input = personal();
        input.birth_date = "2012-01-01".to_string();
        input.phone = "123".to_string();
        let err = h.sign_up().go_step4(&mut flow, input).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(flow.step, SignupStep::PersonalDetails);
        // birth date is checked before the phone
        assert_eq!(
            flow.error.as_deref(),
            Some("Enter a valid birth date (age must be 16-100)")
        );
    }

    #[tokio::test]
    async fn test_finalize_requires_known_shop_type() {
        let h = Harness::new();
        let user_id = UserId::new();
        let mut flow = at_shop_step();

        for bad in ["", "furniture"] {
            let err = h
                .sign_up()
                .finalize(&mut flow, shop(bad, "START25"), Some(user_id))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)));
            assert_eq!(flow.step, SignupStep::ShopDetails);
            assert_eq!(flow.error.as_deref(), Some("Select a shop type"));
        }
        assert!(h.repo.find_profile(&user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promo_code_length() {
        let h = Harness::new();
        let user_id = UserId::new();

        let mut flow = at_shop_step();
        let err = h
            .sign_up()
            .finalize(&mut flow, shop("kiyim", " AB "), Some(user_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        h.sign_up()
            .finalize(&mut flow, shop("kiyim", "ABC"), Some(user_id))
            .await
            .unwrap();
        let stored = h.repo.find_profile(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.promo_code.as_deref(), Some("ABC"));
    }

    #[tokio::test]
    async fn test_finalize_without_user() {
        let h = Harness::new();
        let mut flow = at_shop_step();
        let err = h
            .sign_up()
            .finalize(&mut flow, shop("kiyim", "ABC"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserMissing));
        assert_eq!(flow.step, SignupStep::ShopDetails);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_everything_entered() {
        let store = FlakyStore::default();
        store.fail_upsert.store(true, Ordering::SeqCst);
        let h = Harness::with_store(store, FakeGateway::default());
        let mut flow = at_shop_step();

        let err = h
            .sign_up()
            .finalize(&mut flow, shop("texnika", "PROMO1"), Some(UserId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ProfileSave(_)));
        assert_eq!(flow.step, SignupStep::ShopDetails);
        assert_eq!(flow.draft.shop_type, "texnika");
        assert_eq!(flow.draft.promo_code, "PROMO1");
        assert_eq!(flow.draft.phone, "+998 90 123 45 67");

        h.repo.fail_upsert.store(false, Ordering::SeqCst);
        flow.back().unwrap();
        assert_eq!(flow.step, SignupStep::PersonalDetails);
        assert_eq!(flow.draft.shop_type, "texnika");
    }

    #[tokio::test]
    async fn test_preview_matches_stored_username_for_unpadded_date() {
        let h = Harness::new();
        let user_id = UserId::new();
        let mut flow = SignupFlow::new(NOW_MS);
        flow.step = SignupStep::PersonalDetails;
        flow.draft.email = "new@mail.uz".to_string();
        flow.draft.store_name = "Mega Market".to_string();

        let mut input = personal();
        input.birth_date = "1995-7-4".to_string();
        h.sign_up().go_step4(&mut flow, input).unwrap();
        let preview = flow.view().username_preview.unwrap();
        assert_eq!(preview, "@alimarket0495");

        let done = h
            .sign_up()
            .finalize(&mut flow, shop("kiyim", "START25"), Some(user_id))
            .await
            .unwrap();
        assert_eq!(done.username.to_string(), preview);
        let stored = h.repo.find_profile(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some("alimarket0495"));
    }

    #[tokio::test]
    async fn test_failed_lookup_reports_the_stored_username() {
        let store = FlakyStore::default();
        let user_id = UserId::new();
        let mut existing = crate::domain::entity::profile::Profile::empty(user_id);
        existing.username = Some("firsthandle0101".to_string());
        store.inner.put_profile(existing).await;
        store.failing_finds.store(1, Ordering::SeqCst);
        let h = Harness::with_store(store, FakeGateway::default());

        let mut flow = at_shop_step();
        let done = h
            .sign_up()
            .finalize(&mut flow, shop("dorixona", "ABC"), Some(user_id))
            .await
            .unwrap();
        assert_eq!(done.username.as_str(), "firsthandle0101");
        assert_eq!(flow.step, SignupStep::Finalized);
    }

    #[tokio::test]
    async fn test_existing_username_is_kept() {
        let h = Harness::new();
        let user_id = UserId::new();
        let mut existing = crate::domain::entity::profile::Profile::empty(user_id);
        existing.username = Some("firsthandle0101".to_string());
        h.repo.put_profile(existing).await;

        let mut flow = at_shop_step();
        let done = h
            .sign_up()
            .finalize(&mut flow, shop("dorixona", "ABC"), Some(user_id))
            .await
            .unwrap();
        assert_eq!(done.username.as_str(), "firsthandle0101");
        let stored = h.repo.find_profile(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some("firsthandle0101"));
    }
}

#[cfg(test)]
mod onboarding_tests {
    use std::sync::atomic::Ordering;

    use chrono::{TimeZone, Utc};

    use super::fakes::*;
    use crate::application::OnboardingForm;
    use crate::domain::entity::auth_session::AuthSession;
    use crate::domain::entity::profile::Profile;
    use crate::domain::onboarding::PostAuthRoute;
    use crate::domain::repository::ProfileStore;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;

    fn session_for(id: UserId) -> AuthSession {
        let now = Utc.timestamp_millis_opt(NOW_MS).unwrap();
        AuthSession::from_provider(
            provider_session(id, "ali@mail.uz", Some("Ali Valiyev")),
            now,
            3_600_000,
        )
    }

    fn form() -> OnboardingForm {
        OnboardingForm {
            full_name: "Dilnoza".to_string(),
            birth_date: "2001-12-03".to_string(),
            phone: "+998 91 000 11 22".to_string(),
            shop_type: "kosmetika".to_string(),
            shop_name: "Supermarketlar".to_string(),
            source: String::new(),
            promo_code: "DOKON".to_string(),
        }
    }

    #[tokio::test]
    async fn test_check_routes() {
        let h = Harness::new();
        let use_case = h.onboarding();
        assert_eq!(use_case.check(None).await.route, Some(PostAuthRoute::Login));

        let id = UserId::new();
        let session = session_for(id);
        let check = use_case.check(Some(&session)).await;
        assert_eq!(check.route, None);
        let prefill = check.form.unwrap();
        assert_eq!(prefill.full_name, "Ali Valiyev");
        assert_eq!(prefill.phone, "");

        h.repo.put_profile(complete_profile(id)).await;
        let check = use_case.check(Some(&session)).await;
        assert_eq!(check.route, Some(PostAuthRoute::Root));
        assert!(check.form.is_none());
    }

    #[tokio::test]
    async fn test_submit_completes_profile() {
        let h = Harness::new();
        let id = UserId::new();

        let out = h.onboarding().submit(Some(id), form()).await.unwrap();
        assert_eq!(out.username.as_str(), "dilnozasuperm0301");
        assert_eq!(out.route, PostAuthRoute::Root);
        assert!(h.repo.find_profile(&id).await.unwrap().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_submit_keeps_stored_username_when_lookup_fails() {
        let store = FlakyStore::default();
        let id = UserId::new();
        store
            .inner
            .put_profile(Profile {
                username: Some("oldhandle0101".to_string()),
                ..Profile::empty(id)
            })
            .await;
        store.failing_finds.store(1, Ordering::SeqCst);
        let h = Harness::with_store(store, FakeGateway::default());

        let out = h.onboarding().submit(Some(id), form()).await.unwrap();
        assert_eq!(out.username.as_str(), "oldhandle0101");
        let stored = h.repo.find_profile(&id).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some("oldhandle0101"));
        assert!(stored.is_complete());
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_form_and_missing_user() {
        let h = Harness::new();
        let mut bad = form();
        bad.source = "radio".to_string();
        assert!(matches!(
            h.onboarding().submit(Some(UserId::new()), bad).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            h.onboarding().submit(None, form()).await,
            Err(AuthError::UserMissing)
        ));
    }
}

#[cfg(test)]
mod oauth_tests {
    use super::fakes::*;
    use crate::application::oauth::Pkce;
    use crate::domain::onboarding::PostAuthRoute;
    use crate::domain::value_object::oauth_provider::OAuthProvider;

    #[tokio::test]
    async fn test_start_uses_pkce_challenge() {
        let h = Harness::new();
        let start = h.oauth().start(OAuthProvider::Google);
        let challenge = Pkce::challenge_for(&start.verifier);
        assert!(start.authorize_url.contains(&challenge));
        assert!(start.authorize_url.contains("provider=google"));
        assert!(start.authorize_url.contains("/api/auth/callback"));
    }

    #[tokio::test]
    async fn test_callback_without_code_or_verifier_lands_on_login() {
        let h = Harness::new();
        let out = h.oauth().callback(None, Some("verifier"), "device").await;
        assert_eq!(out.route, PostAuthRoute::Login);
        assert!(out.session.is_none());

        let out = h.oauth().callback(Some(OAUTH_CODE), None, "device").await;
        assert_eq!(out.route, PostAuthRoute::Login);

        let out = h
            .oauth()
            .callback(Some("stale-code"), Some("verifier"), "device")
            .await;
        assert_eq!(out.route, PostAuthRoute::Login);
        assert_eq!(h.repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_first_google_sign_in_needs_onboarding() {
        let h = Harness::new();
        let out = h
            .oauth()
            .callback(Some(OAUTH_CODE), Some("verifier"), "device")
            .await;
        assert_eq!(out.route, PostAuthRoute::Onboarding);
        let (session, token) = out.session.unwrap();
        assert_eq!(session.email.as_deref(), Some(OAUTH_EMAIL));
        assert!(!token.is_empty());
        assert_eq!(h.repo.session_count().await, 1);

        let id = session.user_id;
        h.repo.put_profile(complete_profile(id)).await;
        let out = h
            .oauth()
            .callback(Some(OAUTH_CODE), Some("verifier"), "device")
            .await;
        assert_eq!(out.route, PostAuthRoute::Root);
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::{Extension, Json};
    use kernel::principal::CurrentUser;
    use platform::clock::ManualClock;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::fakes::*;
    use crate::application::config::AuthConfig;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::ATTEMPTS_LEFT_HEADER;
    use crate::infra::MemoryAuthStore;
    use crate::presentation::handlers::AuthAppState;
    use crate::presentation::middleware::{AuthMiddlewareState, require_auth_session};
    use crate::presentation::router::auth_router_generic;

    type State = AuthAppState<MemoryAuthStore, FakeGateway>;

    async fn app() -> (Router, State, UserId) {
        let id = UserId::new();
        let store = MemoryAuthStore::new();
        store.put_profile(complete_profile(id)).await;
        let state = AuthAppState::new(
            store,
            FakeGateway::default().with_account("ali@mail.uz", "secret1", id),
            AuthConfig::development(),
            Arc::new(ManualClock::at(NOW_MS)),
        )
        .unwrap();
        (auth_router_generic(state.clone()), state, id)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        request
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `name=value` from the first Set-Cookie for `name`
    fn cookie_pair(response: &axum::response::Response, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }

    fn login_body(password: &str) -> Value {
        json!({ "username": "@alimarket1495", "email": "ali@mail.uz", "password": password })
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(post_json("/login", login_body("secret1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = cookie_pair(&response, "sd_session").unwrap();
        let body = body_json(response).await;
        assert_eq!(body["redirectTo"], "/");
        assert_eq!(body["route"], "root");

        let response = app
            .oneshot(get_with_cookie("/session", Some(&cookie)))
            .await
            .unwrap();
        let nav = body_json(response).await;
        assert_eq!(nav["signedIn"], true);
        assert_eq!(nav["email"], "ali@mail.uz");
        assert_eq!(nav["shopName"], "Mega Market");
    }

    #[tokio::test]
    async fn test_failed_login_reports_attempts_left() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(post_json("/login", login_body("wrong-pass")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[ATTEMPTS_LEFT_HEADER], "4");
        let device = cookie_pair(&response, "sd_device").unwrap();

        let response = app
            .clone()
            .oneshot(get_with_cookie("/login/lockout", Some(&device)))
            .await
            .unwrap();
        assert!(cookie_pair(&response, "sd_device").is_none());
        let status = body_json(response).await;
        assert_eq!(status["attempts"], 1);
        assert_eq!(status["locked"], false);

        // no cookie means a new browser with a clean slate
        let response = app
            .oneshot(get_with_cookie("/login/lockout", None))
            .await
            .unwrap();
        assert!(cookie_pair(&response, "sd_device").is_some());
        assert_eq!(body_json(response).await["attempts"], 0);
    }

    #[tokio::test]
    async fn test_lockout_is_per_device_cookie_not_user_agent() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/login/lockout", None))
            .await
            .unwrap();
        let attacker = cookie_pair(&response, "sd_device").unwrap();
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(with_cookie(post_json("/login", login_body("wrong-pass")), &attacker))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = app
            .clone()
            .oneshot(with_cookie(post_json("/login", login_body("secret1")), &attacker))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::LOCKED);

        // same User-Agent, different browser
        let response = app
            .clone()
            .oneshot(post_json("/login", login_body("secret1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(cookie_pair(&response, "sd_session").is_some());

        // a forged device cookie is replaced, not trusted
        let forged = format!("{attacker}x");
        let response = app
            .oneshot(get_with_cookie("/login/lockout", Some(&forged)))
            .await
            .unwrap();
        assert!(cookie_pair(&response, "sd_device").is_some());
        assert_eq!(body_json(response).await["locked"], false);
    }

    #[tokio::test]
    async fn test_login_requires_user_agent() {
        let (app, _, _) = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(login_body("secret1").to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signed_out_session_defaults() {
        let (app, _, _) = app().await;
        let response = app.oneshot(get_with_cookie("/session", None)).await.unwrap();
        let nav = body_json(response).await;
        assert_eq!(nav["signedIn"], false);
        assert_eq!(nav["fullName"], "Admin");
        assert_eq!(nav["shopName"], "SMART-DOKON");
    }

    #[tokio::test]
    async fn test_signup_flow_cookie() {
        let (app, state, _) = app().await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/signup", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(post_json("/signup/start", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = cookie_pair(&response, "sd_signup").unwrap();
        assert_eq!(state.flows.len().await, 1);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/signup", Some(&cookie)))
            .await
            .unwrap();
        let view = body_json(response).await;
        assert_eq!(view["step"], "collect-credentials");
        assert_eq!(view["stepNumber"], 1);

        let back = Request::builder()
            .method("POST")
            .uri("/signup/back")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(back).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let forged = format!("{}x", cookie);
        let response = app
            .oneshot(get_with_cookie("/signup", Some(&forged)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oauth_redirects() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(get_with_cookie("/oauth/google", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.contains("code_challenge="));
        assert!(cookie_pair(&response, "sd_oauth_verifier").is_some());

        let response = app
            .clone()
            .oneshot(get_with_cookie("/oauth/github", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get_with_cookie("/callback?error=access_denied", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:3000/auth/login"
        );
    }

    #[tokio::test]
    async fn test_onboarding_check_without_session() {
        let (app, _, _) = app().await;
        let response = app
            .oneshot(get_with_cookie("/onboarding", None))
            .await
            .unwrap();
        let check = body_json(response).await;
        assert_eq!(check["route"], "login");
    }

    #[tokio::test]
    async fn test_live_hints() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(get_with_cookie(
                "/username-preview?fullName=Ali%20Valiyev&storeName=Mega%20Market&birthDate=1995-07-14",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["username"], "@alimarket1495");

        let response = app
            .oneshot(post_json("/password-strength", json!({ "password": "Abcd1234" })))
            .await
            .unwrap();
        let strength = body_json(response).await;
        assert_eq!(strength["score"], 3);
        assert_eq!(strength["label"], "fair");
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (app, _, _) = app().await;
        let response = app
            .oneshot(post_json("/logout", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_middleware_guards_protected_routes() {
        let (app, state, id) = app().await;

        async fn me(Extension(user): Extension<CurrentUser>) -> Json<Value> {
            Json(json!({ "userId": user.user_id.to_string() }))
        }
        let protected = Router::new().route("/me", get(me)).route_layer(from_fn_with_state(
            AuthMiddlewareState::from(&state),
            require_auth_session::<MemoryAuthStore>,
        ));

        let response = protected
            .clone()
            .oneshot(get_with_cookie("/me", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_json("/login", login_body("secret1")))
            .await
            .unwrap();
        let cookie = cookie_pair(&response, "sd_session").unwrap();

        let response = protected
            .oneshot(get_with_cookie("/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["userId"], id.to_string());
    }
}
