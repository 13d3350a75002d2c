//! Token issuance.
//!
//! The issuer owns the signing material for the lifetime of the process,
//! injected through [`TokenConfig`] at construction. Issuance is a pure
//! function of `(subject, roles, now)` plus that fixed configuration; there
//! is no revocation machinery, expiry is the only invalidation.

use crate::config::TokenConfig;
use crate::crypto;
use crate::errors::IdError;
use chrono::{DateTime, Utc};
use common::{Claims, Role};
use secrecy::ExposeSecret;
use std::time::Duration;

pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    /// Build an issuer, validating the signing key up front so a bad key
    /// fails at startup rather than on the first login.
    pub fn new(config: TokenConfig) -> Result<Self, IdError> {
        crypto::public_key_pem_from_pkcs8(config.signing_key.expose_secret())?;
        Ok(Self { config })
    }

    /// Mint a signed credential for `email` carrying one claim per role.
    ///
    /// `iat = now`, `exp = now + lifetime`. The lifetime is fixed at
    /// construction, never per call.
    pub fn issue(
        &self,
        email: &str,
        roles: &[Role],
        now: DateTime<Utc>,
    ) -> Result<String, IdError> {
        let iat = now.timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let exp = iat + self.config.lifetime.as_secs() as i64;

        let claims = Claims {
            sub: email.to_string(),
            roles: roles.to_vec(),
            iat,
            exp,
        };

        crypto::sign_token(&claims, self.config.signing_key.expose_secret())
    }

    /// Verify a presented credential: signature and expiry.
    ///
    /// This is the server-side trust boundary - protected request handling
    /// goes through here on every call, whatever the client's cached view
    /// says.
    pub fn verify(&self, token: &str) -> Result<Claims, IdError> {
        crypto::verify_token(token, &self.config.public_key_pem)
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.config.lifetime
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::decode_unverified;
    use id_test_utils::test_signing_key;

    // Build a `TokenConfig` from a deterministic test key. Mirrors
    // `id_test_utils::test_token_config`, but constructs the config locally so
    // the type resolves to this crate's `TokenConfig` rather than the copy
    // linked through the `id-test-utils` dev-dependency cycle.
    fn test_token_config(seed: u8, lifetime_secs: u64) -> crate::config::TokenConfig {
        let (_, private_key) = test_signing_key(seed).unwrap();
        crate::config::TokenConfig::from_pkcs8(
            private_key,
            std::time::Duration::from_secs(lifetime_secs),
        )
        .unwrap()
    }

    #[test]
    fn test_issued_claims_round_trip() {
        let issuer = TokenIssuer::new(test_token_config(1, 3600)).unwrap();
        let now = Utc::now();

        let token = issuer
            .issue("alice@example.com", &[Role::Reader], now)
            .unwrap();

        let claims = decode_unverified(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.roles, vec![Role::Reader]);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 3600);
    }

    #[test]
    fn test_issue_is_deterministic_for_fixed_inputs() {
        let issuer = TokenIssuer::new(test_token_config(1, 3600)).unwrap();
        let now = Utc::now();

        let first = issuer
            .issue("alice@example.com", &[Role::Reader, Role::Writer], now)
            .unwrap();
        let second = issuer
            .issue("alice@example.com", &[Role::Reader, Role::Writer], now)
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_accepts_own_tokens() {
        let issuer = TokenIssuer::new(test_token_config(1, 3600)).unwrap();

        let token = issuer
            .issue("alice@example.com", &[Role::Writer], Utc::now())
            .unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert!(claims.has_role(Role::Writer));
    }

    #[test]
    fn test_verify_rejects_tokens_from_another_issuer() {
        let issuer = TokenIssuer::new(test_token_config(1, 3600)).unwrap();
        let other = TokenIssuer::new(test_token_config(2, 3600)).unwrap();

        let token = other
            .issue("alice@example.com", &[Role::Writer], Utc::now())
            .unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(IdError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let issuer = TokenIssuer::new(test_token_config(1, 60)).unwrap();
        let issued_at = Utc::now() - chrono::Duration::seconds(120);

        let token = issuer
            .issue("alice@example.com", &[Role::Reader], issued_at)
            .unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(IdError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_new_rejects_invalid_key_material() {
        let config = TokenConfig {
            signing_key: secrecy::SecretBox::new(Box::new(vec![0u8; 16])),
            public_key_pem: String::new(),
            lifetime: Duration::from_secs(3600),
        };

        assert!(matches!(TokenIssuer::new(config), Err(IdError::Crypto(_))));
    }
}
