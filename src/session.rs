use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// Identity issued by the identity provider for a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub id_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// The provider's "current user" for one client, with change notifications.
///
/// Reads are synchronous against the cached value, so they can lag behind a
/// sign-in or sign-out that is still in flight.
#[derive(Clone)]
pub struct SessionState {
    current: Arc<watch::Sender<Option<AuthSession>>>,
    settled: Arc<watch::Sender<bool>>,
}

impl SessionState {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        let (settled, _) = watch::channel(false);
        Self {
            current: Arc::new(current),
            settled: Arc::new(settled),
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn uid(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.uid.clone())
    }

    pub fn id_token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.id_token.clone())
    }

    pub fn set(&self, session: AuthSession) {
        tracing::debug!(uid = %session.uid, "Session established");
        self.current.send_replace(Some(session));
    }

    pub fn clear(&self) {
        if self.current.send_replace(None).is_some() {
            tracing::debug!("Session cleared");
        }
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.current.subscribe()
    }

    /// Signal that the initial session state is known. Only the first call has an effect.
    pub fn mark_settled(&self) {
        self.settled.send_if_modified(|settled| !std::mem::replace(settled, true));
    }

    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    /// Wait for the one-shot "auth state settled" notification.
    pub async fn settled(&self) {
        let mut rx = self.settled.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|settled| *settled).await;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
