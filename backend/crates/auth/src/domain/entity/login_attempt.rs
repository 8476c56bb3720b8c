//! Login Attempt State
//!
//! Consecutive failed logins for one device. The state is a plain value;
//! loading, saving and the clock live in the application layer.
//!
//! ```text
//!   Open(n) --failure, n+1 < max--> Open(n+1)
//!   Open(n) --failure, n+1 = max--> Locked(deadline)
//!   Locked  --deadline passed-----> Open(0)   (slot cleared on load)
//!   any     --success-------------> Open(0)
//! ```

use platform::lockout::{LockoutPolicy, remaining_secs};
use serde::{Deserialize, Serialize};

/// Fixed storage key; the device key is appended
pub const LOGIN_META_KEY: &str = "sd_login_meta";

pub fn meta_key(device_key: &str) -> String {
    format!("{LOGIN_META_KEY}:{device_key}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttemptState {
    pub attempts: u32,
    /// `0` when not locked
    pub locked_until_ms: i64,
}

impl LoginAttemptState {
    pub fn is_locked(&self, now_ms: i64) -> bool {
        self.locked_until_ms > now_ms
    }

    /// A lock was set and its deadline has passed
    pub fn is_expired_lock(&self, now_ms: i64) -> bool {
        self.locked_until_ms != 0 && !self.is_locked(now_ms)
    }

    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        remaining_secs(self.locked_until_ms, now_ms)
    }

    pub fn attempts_left(&self, policy: &LoginAttemptPolicy) -> u32 {
        policy.max_attempts.saturating_sub(self.attempts)
    }

    /// Count one failure; locks when the count reaches the maximum
    pub fn record_failure(self, policy: &LoginAttemptPolicy, now_ms: i64) -> Self {
        let attempts = self.attempts.saturating_add(1);
        let locked_until_ms = if attempts >= policy.max_attempts {
            policy.locked_until(now_ms)
        } else {
            self.locked_until_ms
        };
        Self {
            attempts,
            locked_until_ms,
        }
    }

    pub fn reset() -> Self {
        Self::default()
    }
}

pub type LoginAttemptPolicy = LockoutPolicy;
