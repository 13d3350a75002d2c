//! Pre-navigation session guard.
//!
//! [`decide`] is a pure function over `(stored credential, cached session,
//! target route, now)`; [`SessionGuard`] is the thin shell that applies its
//! effects to the session store. Keeping the two apart makes every branch
//! unit-testable without a store or a clock.
//!
//! Branches, in order, each terminal:
//!
//! 1. No stored credential or no cached session: redirect to login,
//!    preserving the requested destination.
//! 2. Claims don't decode: same as 1. (Decoding without signature
//!    verification is fine here - the service re-verifies on every call.)
//! 3. Credential expired: redirect to login, destination preserved.
//! 4. Route's required role present in the cached session's role set (or no
//!    role required): allow.
//! 5. Otherwise: deny. The session stays - the user is logged in, just not
//!    allowed through this one door.

use crate::session::{Session, SessionStore};
use chrono::{DateTime, Utc};
use common::{decode_unverified, Role};

/// A navigation target and the role it requires, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAccess {
    pub path: String,
    pub required_role: Option<Role>,
}

impl RouteAccess {
    /// A protected route any authenticated user may open.
    pub fn public(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_role: None,
        }
    }

    /// A protected route requiring a specific role.
    pub fn requiring(path: impl Into<String>, role: Role) -> Self {
        Self {
            path: path.into(),
            required_role: Some(role),
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed to the requested route.
    Allow,
    /// Force re-authentication; `return_url` is the originally requested
    /// destination, restored after login.
    RedirectToLogin { return_url: String },
    /// The session is valid but lacks the required role. Surface an
    /// unauthorized signal; do not log out.
    Deny,
}

/// The guard's decision function. Pure: no clock reads, no store access,
/// no effects.
pub fn decide(
    token: Option<&str>,
    session: Option<&Session>,
    route: &RouteAccess,
    now: DateTime<Utc>,
) -> GuardDecision {
    let redirect = || GuardDecision::RedirectToLogin {
        return_url: route.path.clone(),
    };

    let (token, session) = match (token, session) {
        (Some(token), Some(session)) => (token, session),
        _ => return redirect(),
    };

    let claims = match decode_unverified(token) {
        Ok(claims) => claims,
        Err(_) => return redirect(),
    };

    if claims.is_expired(now) {
        return redirect();
    }

    match route.required_role {
        None => GuardDecision::Allow,
        Some(required) if session.roles.contains(&required) => GuardDecision::Allow,
        Some(_) => GuardDecision::Deny,
    }
}

/// Effect-applying shell around [`decide`].
#[derive(Debug, Clone)]
pub struct SessionGuard {
    store: SessionStore,
}

impl SessionGuard {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Evaluate a navigation against the current session.
    ///
    /// On a redirect outcome the session is cleared inside the same
    /// critical section that read it, so no observer sees a session the
    /// guard has already condemned.
    pub fn check(&self, route: &RouteAccess, now: DateTime<Utc>) -> GuardDecision {
        self.store.with_slot(|slot| {
            let decision = {
                let session = slot.as_ref();
                let token = session.map(|s| {
                    use common::secret::ExposeSecret;
                    s.token.expose_secret().to_owned()
                });
                decide(token.as_deref(), session, route, now)
            };

            if let GuardDecision::RedirectToLogin { .. } = decision {
                *slot = None;
            }

            decision
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeZone;
    use common::secret::SecretString;
    use common::Claims;

    const T0: i64 = 1_700_000_000;

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    /// An unsigned token with the given claims. The guard never verifies
    /// signatures, so a placeholder signature part is enough.
    fn token_with(roles: &[Role], iat: i64, exp: i64) -> String {
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            roles: roles.to_vec(),
            iat,
            exp,
        };
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        format!("{header}.{payload}.signature")
    }

    fn session_with(token: &str, roles: &[Role]) -> Session {
        Session {
            token: SecretString::from(token.to_string()),
            email: "alice@example.com".to_string(),
            roles: roles.to_vec(),
        }
    }

    fn writer_route() -> RouteAccess {
        RouteAccess::requiring("/admin/blogposts/add", Role::Writer)
    }

    #[test]
    fn test_missing_credential_redirects_with_return_url() {
        let route = writer_route();

        let decision = decide(None, None, &route, at(T0));

        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_url: "/admin/blogposts/add".to_string()
            }
        );
    }

    #[test]
    fn test_token_without_cached_session_redirects() {
        let token = token_with(&[Role::Writer], T0, T0 + 3600);
        let route = writer_route();

        let decision = decide(Some(&token), None, &route, at(T0));

        assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
    }

    #[test]
    fn test_session_without_token_redirects() {
        let session = session_with("unused", &[Role::Writer]);
        let route = writer_route();

        let decision = decide(None, Some(&session), &route, at(T0));

        assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
    }

    #[test]
    fn test_undecodable_credential_redirects() {
        let session = session_with("garbage", &[Role::Writer]);
        let route = writer_route();

        let decision = decide(Some("garbage"), Some(&session), &route, at(T0));

        assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
    }

    #[test]
    fn test_expired_credential_redirects_regardless_of_roles() {
        // 60-minute credential evaluated at T+61min
        let token = token_with(&[Role::Reader, Role::Writer], T0, T0 + 3600);
        let session = session_with(&token, &[Role::Reader, Role::Writer]);
        let route = writer_route();

        let decision = decide(Some(&token), Some(&session), &route, at(T0 + 61 * 60));

        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_url: "/admin/blogposts/add".to_string()
            }
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let token = token_with(&[Role::Writer], T0, T0 + 3600);
        let session = session_with(&token, &[Role::Writer]);
        let route = writer_route();

        // One second before expiry: allowed
        assert_eq!(
            decide(Some(&token), Some(&session), &route, at(T0 + 3599)),
            GuardDecision::Allow
        );
        // At expiry: treated as absent
        assert!(matches!(
            decide(Some(&token), Some(&session), &route, at(T0 + 3600)),
            GuardDecision::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn test_missing_role_denies_without_redirect() {
        let token = token_with(&[Role::Reader], T0, T0 + 3600);
        let session = session_with(&token, &[Role::Reader]);
        let route = writer_route();

        let decision = decide(Some(&token), Some(&session), &route, at(T0 + 60));

        assert_eq!(decision, GuardDecision::Deny);
    }

    #[test]
    fn test_role_check_uses_cached_session_not_claims() {
        // Claims say Writer, cache says Reader: the cached view decides
        let token = token_with(&[Role::Writer], T0, T0 + 3600);
        let session = session_with(&token, &[Role::Reader]);
        let route = writer_route();

        assert_eq!(
            decide(Some(&token), Some(&session), &route, at(T0 + 60)),
            GuardDecision::Deny
        );
    }

    #[test]
    fn test_route_without_role_requirement_allows_any_session() {
        let token = token_with(&[Role::Reader], T0, T0 + 3600);
        let session = session_with(&token, &[Role::Reader]);
        let route = RouteAccess::public("/admin/profile");

        assert_eq!(
            decide(Some(&token), Some(&session), &route, at(T0 + 60)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_guard_clears_session_on_expiry_redirect() {
        let token = token_with(&[Role::Writer], T0, T0 + 3600);
        let store = SessionStore::new();
        store.set(session_with(&token, &[Role::Writer]));
        let guard = SessionGuard::new(store.clone());

        let decision = guard.check(&writer_route(), at(T0 + 7200));

        assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
        assert!(store.snapshot().is_none(), "session must be destroyed");
    }

    #[test]
    fn test_guard_keeps_session_on_deny() {
        let token = token_with(&[Role::Reader], T0, T0 + 3600);
        let store = SessionStore::new();
        store.set(session_with(&token, &[Role::Reader]));
        let guard = SessionGuard::new(store.clone());

        let decision = guard.check(&writer_route(), at(T0 + 60));

        assert_eq!(decision, GuardDecision::Deny);
        assert!(
            store.snapshot().is_some(),
            "denied navigation must not log the user out"
        );
    }

    #[test]
    fn test_guard_redirects_when_no_session_stored() {
        let guard = SessionGuard::new(SessionStore::new());

        let decision = guard.check(&writer_route(), at(T0));

        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_url: "/admin/blogposts/add".to_string()
            }
        );
    }

    #[test]
    fn test_guard_allows_valid_writer_session() {
        let token = token_with(&[Role::Reader, Role::Writer], T0, T0 + 3600);
        let store = SessionStore::new();
        store.set(session_with(&token, &[Role::Reader, Role::Writer]));
        let guard = SessionGuard::new(store.clone());

        assert_eq!(guard.check(&writer_route(), at(T0 + 60)), GuardDecision::Allow);
        assert!(store.snapshot().is_some());
    }
}
