//! Onboarding Completeness Gate
//!
//! The single decision used after password login, after the OAuth callback
//! and by the onboarding page's self-check.

use serde::Serialize;

use crate::domain::entity::profile::Profile;

/// A missing profile needs onboarding too
pub fn needs_onboarding(profile: Option<&Profile>) -> bool {
    profile.is_none_or(|p| !p.is_complete())
}

/// Where the browser goes after authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostAuthRoute {
    Onboarding,
    Root,
    Login,
}

impl PostAuthRoute {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        if needs_onboarding(profile) {
            PostAuthRoute::Onboarding
        } else {
            PostAuthRoute::Root
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PostAuthRoute::Onboarding => "/onboarding",
            PostAuthRoute::Root => "/",
            PostAuthRoute::Login => "/auth/login",
        }
    }
}
