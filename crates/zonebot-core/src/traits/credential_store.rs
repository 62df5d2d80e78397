// # Credential Store Trait
//
// Defines the interface for the durable account-name → API token mapping.
//
// ## Purpose
//
// The credential store is the only owner of account secrets. Sessions keep
// the *name* of the active account and ask the store for the token on every
// lookup, so a deleted account can never be used by a stale session.
//
// ## Implementations
//
// - File-based: JSON mapping on disk (`FileCredentialStore`)
// - In-memory: tests and throwaway deployments (`MemoryCredentialStore`)
//
// ## Usage
//
// ```rust,ignore
// use zonebot_core::{ApiToken, CredentialStore};
//
// let store = /* CredentialStore implementation */;
// store.save("work", &ApiToken::new("cf-token")).await?;
// let accounts = store.list().await?;
// store.delete("work").await?;
// ```

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Account name → token, in insertion order
pub type Accounts = IndexMap<String, ApiToken>;

/// Provider API token
///
/// The Debug implementation intentionally does NOT expose the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the Authorization header only
    /// ⚠️ NEVER log this value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(<REDACTED>)")
    }
}

/// Trait for credential store implementations
///
/// Every call is atomic relative to the single operator. Implementations are
/// not designed for multiple concurrent writers.
///
/// # Reads are defensive
///
/// `list()` must treat an unreadable or corrupt backing store as empty
/// rather than fail the caller. Write failures are reported.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load every stored account
    ///
    /// # Returns
    ///
    /// - `Ok(Accounts)`: All accounts (possibly empty)
    /// - `Err(Error)`: Only for failures that are not plain corruption
    async fn list(&self) -> Result<Accounts, crate::Error>;

    /// Insert or replace an account and persist immediately
    ///
    /// # Parameters
    ///
    /// - `name`: Account name (identity)
    /// - `token`: Provider API token
    async fn save(&self, name: &str, token: &ApiToken) -> Result<(), crate::Error>;

    /// Remove an account and persist immediately
    ///
    /// Deleting an unknown name is a no-op.
    async fn delete(&self, name: &str) -> Result<(), crate::Error>;

    /// Token for a single account
    async fn get(&self, name: &str) -> Result<Option<ApiToken>, crate::Error> {
        Ok(self.list().await?.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_not_exposed_in_debug() {
        let token = ApiToken::new("secret_token_12345");
        let debug_str = format!("{:?}", token);
        assert!(!debug_str.contains("secret_token"));
        assert_eq!(token.expose(), "secret_token_12345");
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let json = serde_json::to_string(&ApiToken::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
