//! Lockout Tracker
//!
//! Loads, updates and persists the per-device [`LoginAttemptState`]. Reads
//! go through here so an expired lock is cleared from the store as soon as
//! anyone looks at it.

use std::sync::Arc;
use std::time::Duration;

use platform::clock::Clock;
use platform::countdown::Countdown;
use platform::lockout::LockoutPolicy;
use serde::Serialize;

use crate::domain::entity::login_attempt::{LoginAttemptState, meta_key};
use crate::domain::repository::LoginMetaStore;
use crate::error::{AuthError, AuthResult};

/// What the login page shows before the owner types anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutStatus {
    pub locked: bool,
    pub remaining_secs: u64,
    pub attempts: u32,
    pub attempts_left: u32,
}

pub struct LockoutTracker<R>
where
    R: LoginMetaStore,
{
    repo: Arc<R>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl<R> LockoutTracker<R>
where
    R: LoginMetaStore,
{
    pub fn new(repo: Arc<R>, policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            policy,
            clock,
        }
    }

    /// Current state; an elapsed lock is reset and the slot cleared
    pub async fn load(&self, device_key: &str) -> AuthResult<LoginAttemptState> {
        let key = meta_key(device_key);
        let state = self.repo.load_login_meta(&key).await?;
        if state.is_expired_lock(self.clock.now_ms()) {
            self.repo.clear_login_meta(&key).await?;
            tracing::debug!(device_key, "Expired login lock cleared");
            return Ok(LoginAttemptState::reset());
        }
        Ok(state)
    }

    pub async fn status(&self, device_key: &str) -> AuthResult<LockoutStatus> {
        let state = self.load(device_key).await?;
        let now_ms = self.clock.now_ms();
        Ok(LockoutStatus {
            locked: state.is_locked(now_ms),
            remaining_secs: state.remaining_secs(now_ms),
            attempts: state.attempts,
            attempts_left: state.attempts_left(&self.policy),
        })
    }

    /// Rejects while locked, before any provider call
    pub async fn ensure_open(&self, device_key: &str) -> AuthResult<LoginAttemptState> {
        let state = self.load(device_key).await?;
        let now_ms = self.clock.now_ms();
        if state.is_locked(now_ms) {
            return Err(AuthError::Locked {
                remaining_secs: state.remaining_secs(now_ms),
            });
        }
        Ok(state)
    }

    /// Count a failure and wrap `cause` with the attempts left
    pub async fn record_failure(&self, device_key: &str, cause: AuthError) -> AuthError {
        let now_ms = self.clock.now_ms();
        let state = match self.load(device_key).await {
            Ok(state) => state.record_failure(&self.policy, now_ms),
            Err(e) => return e,
        };
        if let Err(e) = self
            .repo
            .save_login_meta(&meta_key(device_key), &state)
            .await
        {
            return e;
        }

        let locked_for_secs = state
            .is_locked(now_ms)
            .then(|| state.remaining_secs(now_ms));
        if locked_for_secs.is_some() {
            tracing::warn!(device_key, attempts = state.attempts, "Device locked");
        }

        AuthError::CountedFailure {
            cause: Box::new(cause),
            attempts_left: state.attempts_left(&self.policy),
            locked_for_secs,
        }
    }

    pub async fn reset(&self, device_key: &str) -> AuthResult<()> {
        self.repo.clear_login_meta(&meta_key(device_key)).await
    }

    /// Ticking countdown to the end of the current lock, if any
    pub async fn countdown(&self, device_key: &str) -> AuthResult<Option<Countdown>> {
        let state = self.load(device_key).await?;
        let left_ms = state.locked_until_ms.saturating_sub(self.clock.now_ms());
        if left_ms <= 0 {
            return Ok(None);
        }
        Ok(Some(Countdown::start(Duration::from_millis(left_ms as u64))))
    }
}
