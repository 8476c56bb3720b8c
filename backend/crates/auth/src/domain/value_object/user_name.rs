//! Username Value Object
//!
//! The username is derived once, when the profile first becomes complete,
//! and is then a login credential next to the password. It is never typed
//! in by the owner, so the only input path is [`Username::derive`].
//!
//! ## Derivation
//! `first(full_name) + last(shop_name)[..6] + day(birth_date) + yy(birth_date)`
//!
//! - `first`: first whitespace token of the full name, lowercased, `a-z` only
//! - `last`: last whitespace token of the shop name, same filter, at most 6 chars
//! - `day`: zero-padded day of the date, `"01"` when absent
//! - `yy`: last two digits of the year, from `"2000"` when absent
//!
//! A date that parses is read in its canonical form, so `1995-7-4` and
//! `1995-07-04` give the same username. A partial date falls back to the
//! digits of its `-` segments. The output is always `[a-z0-9]+`.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::domain::validator::{LOGIN_USERNAME_MIN, parse_birth_date};

const STORE_TOKEN_MAX: usize = 6;
const DEFAULT_DAY: &str = "01";
const DEFAULT_YEAR: &str = "2000";

/// Generated, immutable login handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn derive(full_name: &str, shop_name: &str, birth_date: &str) -> Self {
        let first = full_name
            .split_whitespace()
            .next()
            .map(ascii_letters)
            .unwrap_or_default();

        let store: String = shop_name
            .split_whitespace()
            .next_back()
            .map(ascii_letters)
            .unwrap_or_default()
            .chars()
            .take(STORE_TOKEN_MAX)
            .collect();

        let (year, day) = date_segments(birth_date);
        let year_end = last_chars(&year, 2);

        Self(format!("{first}{store}{day}{year_end}"))
    }

    /// Value already stored in `profiles.username`
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against what the owner typed at login
    pub fn matches(&self, handle: &LoginHandle) -> bool {
        self.0.to_lowercase() == handle.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

fn ascii_letters(token: &str) -> String {
    token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

fn ascii_digits(token: &str) -> String {
    token.chars().filter(char::is_ascii_digit).collect()
}

/// `(year, day)` as digit strings
fn date_segments(birth_date: &str) -> (String, String) {
    if let Some(date) = parse_birth_date(birth_date) {
        return (format!("{:04}", date.year()), format!("{:02}", date.day()));
    }

    let mut segments = birth_date.trim().split('-').map(ascii_digits);
    let year = segments
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_YEAR.to_string());
    let day = segments
        .nth(1)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DAY.to_string());
    (year, day)
}

fn last_chars(value: &str, n: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(n)).collect()
}

/// Username as typed on the login form
///
/// NFKC-normalized (full-width letters from mobile keyboards fold to ASCII),
/// trimmed, lowercased, one leading `@` removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginHandle(String);

impl LoginHandle {
    pub fn new(raw: &str) -> Self {
        let normalized: String = raw.nfkc().collect();
        let lowered = normalized.trim().to_lowercase();
        let handle = lowered.strip_prefix('@').unwrap_or(&lowered);
        Self(handle.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shape check on the raw input, before normalization
    pub fn is_acceptable(raw: &str) -> bool {
        raw.trim().chars().count() >= LOGIN_USERNAME_MIN
    }
}
