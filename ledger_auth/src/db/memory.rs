//! In-process identity store.
//!
//! Behaves like the PostgreSQL store (sequential IDs, unique emails, exact
//! email match) without a database. Used by tests and by embedders that keep
//! identities elsewhere.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::IdentityStore;
use crate::auth::{AuthError, AuthResult, Identity, PasswordDigest, UserId};

#[derive(Debug)]
struct Records {
    identities: BTreeMap<UserId, Identity>,
    next_id: UserId,
}

/// Identity store kept in memory
#[derive(Debug, Clone)]
pub struct MemoryIdentityStore {
    records: Arc<Mutex<Records>>,
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Records {
                identities: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Preload an identity, keeping its ID
    pub fn with_identity(self, identity: Identity) -> Self {
        {
            let mut records = self.lock();
            records.next_id = records.next_id.max(identity.id.saturating_add(1));
            records.identities.insert(identity.id, identity);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.lock().identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // Records are replaced whole, so a poisoned lock still holds
        // consistent data
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create_identity(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &PasswordDigest,
    ) -> AuthResult<UserId> {
        let mut records = self.lock();
        if records.identities.values().any(|i| i.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let id = records.next_id;
        if records.identities.contains_key(&id) {
            // Sequence ran into i64::MAX, as a BIGSERIAL would
            return Err(sqlx::Error::Protocol("identity ID sequence exhausted".to_string()).into());
        }
        records.next_id = id.saturating_add(1);
        records.identities.insert(
            id,
            Identity {
                id,
                email: email.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                password: password.clone(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: None,
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>> {
        let records = self.lock();
        Ok(records
            .identities
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<Identity>> {
        Ok(self.lock().identities.get(&user_id).cloned())
    }

    async fn persist(&self, identity: &Identity) -> AuthResult<()> {
        let mut records = self.lock();
        match records.identities.get_mut(&identity.id) {
            Some(stored) => {
                *stored = identity.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> PasswordDigest {
        PasswordDigest::from_stored("hash123")
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryIdentityStore::new();

        let first = store
            .create_identity("a@x.com", "Ada", "Lovelace", &digest())
            .await
            .unwrap();
        let second = store
            .create_identity("b@x.com", "Bob", "Builder", &digest())
            .await
            .unwrap();

        assert_eq!(first, 1, "First identity should have ID 1");
        assert_eq!(second, 2, "Second identity should have ID 2");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryIdentityStore::new();
        store
            .create_identity("a@x.com", "Ada", "Lovelace", &digest())
            .await
            .unwrap();

        let err = store
            .create_identity("a@x.com", "Other", "Person", &digest())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_find_by_email_is_exact() {
        let store = MemoryIdentityStore::new();
        store
            .create_identity("a@x.com", "Ada", "Lovelace", &digest())
            .await
            .unwrap();

        assert!(store.find_by_email("a@x.com").await.unwrap().is_some());
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_updates_record() {
        let store = MemoryIdentityStore::new();
        let id = store
            .create_identity("a@x.com", "Ada", "Lovelace", &digest())
            .await
            .unwrap();

        let mut identity = store.find_by_id(id).await.unwrap().unwrap();
        assert!(identity.is_active, "Identity should be active initially");

        identity.is_active = false;
        store.persist(&identity).await.unwrap();

        let identity = store.find_by_id(id).await.unwrap().unwrap();
        assert!(!identity.is_active, "Identity should be inactive after persist");
    }

    #[tokio::test]
    async fn test_persist_unknown_identity() {
        let store = MemoryIdentityStore::new();
        assert!(store.is_empty());

        let ghost = Identity {
            id: 42,
            email: "ghost@x.com".to_string(),
            first_name: "Ghost".to_string(),
            last_name: "User".to_string(),
            password: digest(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let err = store.persist(&ghost).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_preload_at_max_id() {
        let last = Identity {
            id: i64::MAX,
            email: "last@x.com".to_string(),
            first_name: "Last".to_string(),
            last_name: "One".to_string(),
            password: digest(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let store = MemoryIdentityStore::new().with_identity(last);
        assert!(store.find_by_id(i64::MAX).await.unwrap().is_some());

        let err = store
            .create_identity("next@x.com", "Next", "One", &digest())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
        assert_eq!(
            store.find_by_id(i64::MAX).await.unwrap().unwrap().email,
            "last@x.com"
        );
    }

    #[tokio::test]
    async fn test_with_identity_preloads() {
        let preloaded = Identity {
            id: 100,
            email: "preloaded@x.com".to_string(),
            first_name: "Pre".to_string(),
            last_name: "Loaded".to_string(),
            password: digest(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let store = MemoryIdentityStore::new().with_identity(preloaded);

        let found = store.find_by_id(100).await.unwrap().unwrap();
        assert_eq!(found.email, "preloaded@x.com");

        let next = store
            .create_identity("next@x.com", "Next", "One", &digest())
            .await
            .unwrap();
        assert_eq!(next, 101);
    }
}
