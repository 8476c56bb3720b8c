//! Attempt lockout policy
//!
//! After `max_attempts` consecutive failures the subject is locked for
//! `lockout`. Only the policy numbers and the time arithmetic live here;
//! the state itself is owned by the domain crate.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::from_secs(120),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            max_attempts,
            lockout: Duration::from_secs(lockout_secs),
        }
    }

    pub fn lockout_ms(&self) -> i64 {
        i64::try_from(self.lockout.as_millis()).unwrap_or(i64::MAX)
    }

    /// Deadline for a lock starting at `now_ms`
    pub fn locked_until(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.lockout_ms())
    }
}

/// Whole seconds until `deadline_ms`, rounded up; 0 once reached
pub fn remaining_secs(deadline_ms: i64, now_ms: i64) -> u64 {
    let left_ms = deadline_ms.saturating_sub(now_ms);
    if left_ms <= 0 {
        0
    } else {
        (left_ms as u64).div_ceil(1000)
    }
}
