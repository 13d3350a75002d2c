//! Credential claim set and unverified decoding.
//!
//! A credential is a signed JWT carrying the subject's email, role claims,
//! and the issued-at/expiry pair. [`decode_unverified`] reads the claims
//! without checking the signature; it exists for the client-side session
//! cache, where the decoded view drives UX decisions only. The identity
//! service re-verifies the signature on every protected call, so a forged
//! payload buys an attacker nothing past their own screen.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Generic error values prevent information leakage; detail is logged
//!   at debug level only
//! - The `sub` field is redacted in Debug output

use crate::role::Role;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum allowed credential size in bytes (8KB).
///
/// Typical tokens here are 300-600 bytes (header + claims + signature).
/// Oversized tokens are rejected before base64 decode or any cryptographic
/// work, bounding the resources a hostile token can consume.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Claim set carried inside a signed credential.
///
/// Invariant: the values are trustworthy only after signature verification.
/// Once `exp` has passed, the credential is treated as absent regardless of
/// signature validity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's normalized email.
    pub sub: String,

    /// Role claims, one per assigned role.
    pub roles: Vec<Role>,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl Claims {
    /// Whether the credential has expired as of `now`.
    ///
    /// A credential is expired from the instant `now` reaches `exp`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Whether the claim set carries the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Errors from unverified claim decoding.
///
/// Deliberately coarse: callers treat every failure the same way (the
/// credential is unusable), and the variants exist for logging and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// Token size exceeds [`MAX_TOKEN_SIZE_BYTES`].
    #[error("The credential is invalid")]
    TokenTooLarge,

    /// Token is not a structurally valid JWT, or the payload is not a
    /// recognizable claim set.
    #[error("The credential is invalid")]
    Malformed,
}

/// Decode a credential's claims WITHOUT verifying its signature.
///
/// The result is advisory. It is suitable for client-side UX (role-gating a
/// menu, computing expiry locally) and for nothing else; authorization
/// decisions belong to the server, which verifies the signature.
pub fn decode_unverified(token: &str) -> Result<Claims, ClaimsError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "common.claims",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Credential rejected: size exceeds maximum allowed"
        );
        return Err(ClaimsError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.claims",
            parts = parts.len(),
            "Credential rejected: invalid JWT structure"
        );
        return Err(ClaimsError::Malformed);
    }

    let payload_part = parts.get(1).ok_or(ClaimsError::Malformed)?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_part).map_err(|e| {
        tracing::debug!(target: "common.claims", error = %e, "Failed to decode credential payload base64");
        ClaimsError::Malformed
    })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.claims", error = %e, "Failed to parse credential claims JSON");
        ClaimsError::Malformed
    })
}
