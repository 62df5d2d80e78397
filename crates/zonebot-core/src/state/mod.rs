// # Store Implementations
//
// Credential stores (file, memory) and the in-memory session repository.

pub mod file;
pub mod memory;

use std::sync::Arc;

pub use file::FileCredentialStore;
pub use memory::{MemoryCredentialStore, MemorySessionRepository};

use crate::config::CredentialStoreConfig;
use crate::traits::CredentialStore;

/// Build the credential store selected by `config`
pub async fn open_credential_store(
    config: &CredentialStoreConfig,
) -> Result<Arc<dyn CredentialStore>, crate::Error> {
    config.validate()?;
    let store: Arc<dyn CredentialStore> = match config {
        CredentialStoreConfig::File { path } => Arc::new(FileCredentialStore::open(path).await?),
        CredentialStoreConfig::Memory => {
            tracing::warn!("Using in-memory credential store; accounts are lost on restart");
            Arc::new(MemoryCredentialStore::new())
        }
    };
    Ok(store)
}
