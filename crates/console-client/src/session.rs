//! The locally held session: credential plus decoded identity cache.
//!
//! Lifecycle: created on successful login, read on every protected
//! navigation and outbound request, destroyed on logout, forced expiry, or
//! authorization failure. The store is one shared slot behind a lock so
//! that clearing and the decision that caused it are atomic - no window
//! where a protected view sees a half-torn-down session.

use common::secret::SecretString;
use common::Role;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Client-held session: the opaque credential and the decoded view used
/// for UX decisions.
#[derive(Clone)]
pub struct Session {
    /// The signed credential, as issued. Opaque to the client.
    pub token: SecretString,
    /// Decoded identity cache.
    pub email: String,
    /// Decoded role cache; advisory only.
    pub roles: Vec<Role>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Shared slot holding the current session, if any.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current session. A fresh login supersedes, never
    /// mutates, the previous credential.
    pub fn set(&self, session: Session) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(session);
    }

    /// A snapshot of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Destroy the current session.
    pub fn clear(&self) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Run `f` with exclusive access to the slot. Used by the guard so
    /// that reading the session, deciding, and clearing on a redirect
    /// happen under one critical section.
    pub(crate) fn with_slot<R>(&self, f: impl FnOnce(&mut Option<Session>) -> R) -> R {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut slot)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("SessionStore")
            .field("session", &if present { "present" } else { "absent" })
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn session(email: &str) -> Session {
        Session {
            token: SecretString::from("header.payload.signature"),
            email: email.to_string(),
            roles: vec![Role::Reader],
        }
    }

    #[test]
    fn test_set_snapshot_clear() {
        let store = SessionStore::new();
        assert!(store.snapshot().is_none());

        store.set(session("alice@example.com"));
        assert_eq!(
            store.snapshot().map(|s| s.email),
            Some("alice@example.com".to_string())
        );

        store.clear();
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_fresh_login_supersedes_previous_session() {
        let store = SessionStore::new();
        store.set(session("alice@example.com"));
        store.set(session("bob@example.com"));

        assert_eq!(
            store.snapshot().map(|s| s.email),
            Some("bob@example.com".to_string())
        );
    }

    #[test]
    fn test_clones_share_the_slot() {
        let store = SessionStore::new();
        let handle = store.clone();

        store.set(session("alice@example.com"));
        assert!(handle.snapshot().is_some());

        handle.clear();
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let debug_str = format!("{:?}", session("alice@example.com"));

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("header.payload.signature"));
    }
}
