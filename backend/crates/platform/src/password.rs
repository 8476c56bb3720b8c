//! Clear text passwords and strength scoring
//!
//! Passwords are never hashed here: they are forwarded to the auth provider
//! and must not linger in memory afterwards.
//!
//! ## Strength
//! One point each for: length >= 8, length >= 12, an ASCII uppercase letter,
//! an ASCII digit, a character outside `[A-Za-z0-9]`.

use std::fmt;

use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Clear text password, zeroized on drop
///
/// Not `Clone`, and `Debug` is redacted.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("Abcd1234");
/// assert_eq!(format!("{:?}", password), "ClearTextPassword(\"[REDACTED]\")");
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow for the outbound auth request only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn strength(&self) -> PasswordStrength {
        PasswordStrength::of(&self.0)
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

impl PartialEq<str> for ClearTextPassword {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthLabel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Excellent,
}

impl StrengthLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLabel::VeryWeak => "very-weak",
            StrengthLabel::Weak => "weak",
            StrengthLabel::Fair => "fair",
            StrengthLabel::Good => "good",
            StrengthLabel::Excellent => "excellent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: StrengthLabel,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        let len = password.chars().count();
        let checks = [
            len >= 8,
            len >= 12,
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];
        let score = checks.iter().filter(|&&ok| ok).count() as u8;

        let label = match score {
            0 | 1 => StrengthLabel::VeryWeak,
            2 => StrengthLabel::Weak,
            3 => StrengthLabel::Fair,
            4 => StrengthLabel::Good,
            _ => StrengthLabel::Excellent,
        };

        Self { score, label }
    }
}
