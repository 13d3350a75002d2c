//! Client-side session core for the admin console.
//!
//! Three pieces, mirroring what the browser console does around every
//! protected screen:
//!
//! - `session` - the locally held credential plus decoded identity cache
//! - `guard` - the pre-navigation decision: allow, redirect to login, or
//!   deny
//! - `client` - the API client that attaches the bearer credential to
//!   every outbound call
//!
//! Nothing here is a trust boundary. The decoded claims drive UX only; the
//! identity service re-verifies the credential on every protected request.

pub mod client;
pub mod guard;
pub mod session;

pub use client::{ApiClient, ClientError};
pub use guard::{decide, GuardDecision, RouteAccess, SessionGuard};
pub use session::{Session, SessionStore};
