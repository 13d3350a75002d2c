//! Credential store contract.
//!
//! The identity core treats user persistence as an external collaborator:
//! everything it needs is behind [`CredentialStore`], and every operation
//! can fail independently. In particular, role assignment after user
//! creation is a separate, separately-fallible step - the caller owns what
//! to do when the second step fails, not the store.
//!
//! Uniqueness of email and atomicity of a single role assignment are the
//! store's responsibility.

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Role;
use thiserror::Error;
use uuid::Uuid;

/// User identity record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("An account with this email already exists.")]
    DuplicateEmail,

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by email. Matching is case-insensitive over the
    /// trimmed address.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create a user with no roles. The email must be unique.
    async fn create_user(&self, email: &str, password_hash: &str)
        -> Result<UserRecord, StoreError>;

    /// Assign a role to a user. Idempotent.
    async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<(), StoreError>;

    /// All roles assigned to a user, in a stable order.
    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError>;
}

/// Ensure the provisioned editor account exists with both roles.
///
/// Idempotent; run once at startup when seeding is configured. The password
/// hash is computed by the caller so the store never sees a plaintext
/// password.
pub async fn ensure_seed_user(
    store: &dyn CredentialStore,
    email: &str,
    password_hash: &str,
) -> Result<(), StoreError> {
    let user = match store.find_by_email(email).await? {
        Some(user) => user,
        None => store.create_user(email, password_hash).await?,
    };

    store.assign_role(user.user_id, Role::Reader).await?;
    store.assign_role(user.user_id, Role::Writer).await?;

    tracing::info!(email = %email, "Seed editor account ensured");
    Ok(())
}
