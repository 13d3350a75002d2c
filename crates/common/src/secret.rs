//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. Use these for passwords, bearer
//! tokens, and signing-key material: `Debug` output is redacted, so a struct
//! that derives `Debug` over a secret field stays safe to trace, and values
//! are zeroized on drop.
//!
//! Use `SecretString` for passwords and tokens; `SecretBox<Vec<u8>>` for
//! binary key material. Reading the inner value always goes through an
//! explicit `expose_secret()` call.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
