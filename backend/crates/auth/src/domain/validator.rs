//! Credential Validator
//!
//! Pure predicates over raw form input. Every function is total: bad input
//! yields `false`, never a panic. Value objects and use cases build on these
//! so the rules exist in exactly one place.

use chrono::{Datelike, NaiveDate};

pub use platform::password::{PasswordStrength, StrengthLabel};

/// Signup password minimum length
pub const SIGNUP_PASSWORD_MIN: usize = 8;
/// Login password minimum length (accounts created before the signup rule)
pub const LOGIN_PASSWORD_MIN: usize = 6;
pub const NAME_MIN: usize = 2;
pub const LOGIN_USERNAME_MIN: usize = 3;
pub const PROMO_CODE_MIN: usize = 3;
pub const AGE_MIN: i32 = 16;
pub const AGE_MAX: i32 = 100;
pub const OTP_LEN: usize = 6;

/// `<non-space>+@<non-space>+.<non-space>+` with no other `@`
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    if !clean(local) || !clean(domain) {
        return false;
    }
    // some dot with at least one char on each side
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn is_valid_signup_password(value: &str) -> bool {
    value.chars().count() >= SIGNUP_PASSWORD_MIN
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
}

pub fn is_valid_login_password(value: &str) -> bool {
    value.chars().count() >= LOGIN_PASSWORD_MIN
}

pub fn passwords_match(password: &str, confirm: &str) -> bool {
    !confirm.is_empty() && password == confirm
}

/// Full name, shop name
pub fn is_valid_name(value: &str) -> bool {
    value.trim().chars().count() >= NAME_MIN
}

pub fn is_valid_login_username(value: &str) -> bool {
    value.trim().chars().count() >= LOGIN_USERNAME_MIN
}

pub fn is_valid_promo_code(value: &str) -> bool {
    value.trim().chars().count() >= PROMO_CODE_MIN
}

pub fn is_valid_otp(value: &str) -> bool {
    value.len() == OTP_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// `+998` followed by exactly 9 digits, whitespace ignored
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.strip_prefix("+998") {
        Some(rest) => rest.len() == 9 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Parse an ISO `YYYY-MM-DD` calendar date (unpadded fields accepted)
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Age is the naive difference of year components, not day-precise
pub fn age_in_year(birth: NaiveDate, current_year: i32) -> i32 {
    current_year - birth.year()
}

pub fn is_valid_birth_date(value: &str, current_year: i32) -> bool {
    parse_birth_date(value)
        .map(|d| (AGE_MIN..=AGE_MAX).contains(&age_in_year(d, current_year)))
        .unwrap_or(false)
}

/// Render digits as `+998 XX XXX XX XX`
///
/// Non-digits are dropped. Without the `998` country code a national
/// leading `0` is replaced by it, otherwise it is prefixed. Shorter input
/// yields the partial groups typed so far. Idempotent.
pub fn format_phone(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = if digits.starts_with("998") {
        digits
    } else if let Some(national) = digits.strip_prefix('0') {
        format!("998{national}")
    } else {
        format!("998{digits}")
    };

    let n: Vec<char> = digits.chars().take(12).collect();
    let group = |from: usize, to: usize| -> String { n[from..to.min(n.len())].iter().collect() };

    let mut out = String::from("+998");
    for (from, to) in [(3, 5), (5, 8), (8, 10), (10, 12)] {
        if n.len() > from {
            out.push(' ');
            out.push_str(&group(from, to));
        }
    }
    out
}

pub fn password_strength(value: &str) -> PasswordStrength {
    PasswordStrength::of(value)
}
