//! Postgres-backed credential store.
//!
//! Schema (see `migrations/0001_identity.sql`): a `users` table with a
//! unique index over `LOWER(email)`, and a `user_roles` table keyed by
//! `(user_id, role)`. Role values are the closed enumeration's exact
//! strings; anything else in the table is treated as corruption, not as a
//! new role.

use super::{CredentialStore, StoreError, UserRecord};
use async_trait::async_trait;
use common::Role;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT user_id, email, password_hash, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to fetch user by email: {}", e)))?;

        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING user_id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Unique index over LOWER(email)
            if e.to_string().contains("users_email_unique") {
                StoreError::DuplicateEmail
            } else {
                StoreError::Backend(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(user)
    }

    async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to assign role: {}", e)))?;

        Ok(())
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to fetch roles: {}", e)))?;

        rows.into_iter()
            .map(|(raw,)| {
                Role::from_str(&raw)
                    .map_err(|e| StoreError::Backend(format!("Corrupt role row: {}", e)))
            })
            .collect()
    }
}
