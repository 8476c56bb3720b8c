//! Session change notifications
//!
//! Sign-in and sign-out publish a device-scoped nudge. Observers (the nav
//! bar's SSE stream) re-derive their state from `GET /session` rather than
//! trusting the event payload.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use crate::domain::entity::{auth_session::AuthSession, profile::Profile};

const CHANNEL_CAPACITY: usize = 64;

pub const DEFAULT_FULL_NAME: &str = "Admin";
pub const DEFAULT_SHOP_NAME: &str = "SMART-DOKON";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub device_key: String,
}

#[derive(Debug, Clone)]
pub struct SessionBroadcast {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for SessionBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBroadcast {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Fire and forget; no observers is fine
    pub fn publish(&self, kind: AuthEventKind, device_key: &str) {
        let receivers = self
            .tx
            .send(AuthEvent {
                kind,
                device_key: device_key.to_string(),
            })
            .unwrap_or(0);
        tracing::debug!(?kind, receivers, "Session event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Events for one device; lagged receivers skip ahead
    pub fn stream_for(&self, device_key: String) -> impl Stream<Item = AuthEventKind> + Send + 'static + use<> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |event| match event {
            Ok(event) if event.device_key == device_key => Some(event.kind),
            _ => None,
        })
    }
}

/// Nav bar view: who is signed in and which shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub signed_in: bool,
    pub email: Option<String>,
    pub full_name: String,
    pub shop_name: String,
}

impl NavState {
    pub fn derive(session: Option<&AuthSession>, profile: Option<&Profile>) -> Self {
        let non_blank = |v: Option<&String>| v.filter(|s| !s.trim().is_empty()).cloned();
        let profile = session.and(profile);
        Self {
            signed_in: session.is_some(),
            email: session.and_then(|s| s.email.clone()),
            full_name: non_blank(profile.and_then(|p| p.full_name.as_ref()))
                .or_else(|| non_blank(session.and_then(|s| s.display_name.as_ref())))
                .unwrap_or_else(|| DEFAULT_FULL_NAME.to_string()),
            shop_name: non_blank(profile.and_then(|p| p.shop_name.as_ref()))
                .unwrap_or_else(|| DEFAULT_SHOP_NAME.to_string()),
        }
    }

    pub fn signed_out() -> Self {
        Self::derive(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_id::UserId;

    #[test]
    fn test_signed_out_defaults() {
        let nav = NavState::signed_out();
        assert!(!nav.signed_in);
        assert_eq!(nav.full_name, "Admin");
        assert_eq!(nav.shop_name, "SMART-DOKON");
    }

    #[test]
    fn test_profile_wins_over_claims() {
        let profile = Profile {
            full_name: Some("Ali Valiyev".into()),
            shop_name: Some("Mega".into()),
            ..Profile::empty(UserId::new())
        };
        // without a session the profile is ignored
        let nav = NavState::derive(None, Some(&profile));
        assert_eq!(nav.shop_name, "SMART-DOKON");
    }

    #[tokio::test]
    async fn test_stream_filters_by_device() {
        let events = SessionBroadcast::new();
        let mut stream = Box::pin(events.stream_for("mine".to_string()));
        events.publish(AuthEventKind::SignedIn, "theirs");
        events.publish(AuthEventKind::SignedOut, "mine");
        assert_eq!(stream.next().await, Some(AuthEventKind::SignedOut));
    }
}
