//! The platform's role enumeration.
//!
//! Roles are a closed set: every registrant gets `Reader`, and `Writer` is
//! required for all mutating content operations. Representing them as an
//! enum (rather than free-form strings) makes invalid-role states
//! unrepresentable in memory; anything else coming off the wire or out of
//! the store is a parse error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission tier assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Default tier, granted to every new registrant. Read-only access.
    Reader,
    /// Elevated tier required for all mutating content operations.
    /// Never self-granted through registration.
    Writer,
}

impl Role {
    /// Convert to the wire/storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "Reader",
            Role::Writer => "Writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reader" => Ok(Role::Reader),
            "Writer" => Ok(Role::Writer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}
