//! # Identity Test Utilities
//!
//! Shared test utilities for the identity service and console client:
//!
//! - Deterministic crypto fixtures (fixed signing keys for reproducible
//!   tests)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use id_test_utils::*;
//!
//! let issuer = TokenIssuer::new(test_token_config(1, 3600))?;
//! let token = issuer.issue("alice@example.com", &[Role::Reader], now)?;
//!
//! token.assert_valid_jwt()
//!      .assert_for_subject("alice@example.com")
//!      .assert_has_role("Reader");
//! ```

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
