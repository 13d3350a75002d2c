//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued credentials.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub roles: Vec<String>,
}

/// Custom assertions for issued credentials
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("alice@example.com")
///     .assert_has_role("Reader");
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a valid JWT format
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token carries the specified role claim
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert that the token expires within the specified seconds from now
    fn assert_expires_within(&self, seconds: i64) -> &Self;
}

fn decode_claims(token: &str) -> JwtClaims {
    let parts: Vec<_> = token.split('.').collect();
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("Invalid JWT payload");
    serde_json::from_slice(&payload).expect("Failed to parse JWT claims")
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        // Decode and validate header
        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .expect("Failed to base64 decode JWT header");
        let header: JwtHeader =
            serde_json::from_slice(&header_bytes).expect("Failed to parse JWT header JSON");

        assert_eq!(header.alg, "EdDSA", "Expected EdDSA algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        // Decode and validate payload
        let claims = decode_claims(self);
        assert!(
            claims.iat <= claims.exp,
            "Claims must not expire before issuance"
        );

        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.sub, subject,
            "Token subject mismatch: expected '{}', got '{}'",
            subject, claims.sub
        );

        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = decode_claims(self);
        assert!(
            claims.roles.iter().any(|r| r == role),
            "Token does not carry role '{}'. Available roles: {:?}",
            role,
            claims.roles
        );

        self
    }

    fn assert_expires_within(&self, seconds: i64) -> &Self {
        let claims = decode_claims(self);
        let now = chrono::Utc::now().timestamp();

        assert!(
            claims.exp > now,
            "Token is already expired (exp={}, now={})",
            claims.exp,
            now
        );
        assert!(
            claims.exp <= now + seconds,
            "Token expires too late: exp={}, now={}, allowed window={}s",
            claims.exp,
            now,
            seconds
        );

        self
    }
}
