//! In-memory credential store.
//!
//! Backs the zero-config development mode and the test suites. Shares the
//! Postgres store's observable semantics: case-insensitive unique emails,
//! idempotent role assignment, stable role ordering.
//!
//! `fail_role_assignment` turns every `assign_role` call into a backend
//! failure, which is how tests exercise the user-created-but-role-missing
//! partial state.

use super::{CredentialStore, StoreError, UserRecord};
use async_trait::async_trait;
use chrono::Utc;
use common::Role;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    /// Keyed by lowercased email.
    users: HashMap<String, UserRecord>,
    roles: HashMap<Uuid, BTreeSet<Role>>,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
    fail_role_assignment: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `assign_role` call fail.
    pub fn fail_role_assignment(&self, fail: bool) {
        self.fail_role_assignment.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&email.to_lowercase()).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let key = email.to_lowercase();

        if tables.users.contains_key(&key) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = UserRecord {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(key, user.clone());

        Ok(user)
    }

    async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<(), StoreError> {
        if self.fail_role_assignment.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "injected role assignment failure".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        tables.roles.entry(user_id).or_default().insert(role);
        Ok(())
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}
