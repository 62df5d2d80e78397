// # Memory Stores
//
// In-memory implementations of CredentialStore and SessionRepository.
//
// ## Crash Behavior
//
// - Everything is lost on restart
// - Sessions are volatile anyway; the session repository is the production
//   implementation
// - The credential store variant is meant for tests and throwaway deployments

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::session::{Session, UserId};
use crate::traits::credential_store::{Accounts, ApiToken, CredentialStore};
use crate::traits::session_repository::SessionRepository;

/// In-memory credential store
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<Accounts>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `accounts`
    pub fn with_accounts(accounts: Accounts) -> Self {
        Self {
            inner: Arc::new(RwLock::new(accounts)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn list(&self) -> Result<Accounts, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, name: &str, token: &ApiToken) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(name.to_string(), token.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.shift_remove(name);
        Ok(())
    }
}

/// Process-wide session table
///
/// Sessions are cloned out and written back whole, so one user's interaction
/// never holds the lock across a network call.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionRepository {
    inner: Arc<RwLock<HashMap<UserId, Session>>>,
}

impl MemorySessionRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known sessions
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// `true` if no user has interacted yet
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn get_or_create(&self, user: UserId) -> Result<Session, Error> {
        if let Some(session) = self.inner.read().await.get(&user) {
            return Ok(session.clone());
        }

        let mut guard = self.inner.write().await;
        let session = guard.entry(user).or_insert_with(|| {
            tracing::debug!(user, "Creating session");
            Session::new(user)
        });
        Ok(session.clone())
    }

    async fn save(&self, session: Session) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(session.user_id(), session);
        Ok(())
    }
}
