//! Shared identity types for the Inkpress platform.
//!
//! This crate holds the pieces both sides of the trust boundary agree on:
//!
//! - `role` - the closed role enumeration
//! - `claims` - the signed-credential claim set and unverified decoding
//! - `secret` - wrappers for sensitive values
//!
//! Decoding here is *advisory*: the client may read claims for UX decisions,
//! but only the identity service, holding the signing key, can establish
//! that a credential is trustworthy.

pub mod claims;
pub mod role;
pub mod secret;

pub use claims::{decode_unverified, Claims, ClaimsError, MAX_TOKEN_SIZE_BYTES};
pub use role::Role;
