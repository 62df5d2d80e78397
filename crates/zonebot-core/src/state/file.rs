// # File Credential Store
//
// File-based implementation of CredentialStore.
//
// ## File Format
//
// ```json
// {
//   "work": "cf-token-1",
//   "home": "cf-token-2"
// }
// ```
//
// The legacy list form `[{"name": "work", "token": "cf-token-1"}]` is still
// accepted; it is upgraded to the mapping form on first read.
//
// ## Failure Behavior
//
// - Missing file: created empty on open, read as empty afterwards
// - Corrupt file: read as empty (warned), left untouched until the next save
// - Writes: temp file + rename, so a crash never leaves a half-written file
//
// The file is read on every call; nothing is cached in memory.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::traits::credential_store::{Accounts, ApiToken, CredentialStore};

/// Any encoding the accounts file has ever used
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredAccounts {
    Mapping(Accounts),
    Legacy(Vec<LegacyAccount>),
}

#[derive(Debug, Deserialize)]
struct LegacyAccount {
    name: String,
    token: ApiToken,
}

/// JSON file credential store
///
/// # Example
///
/// ```rust,no_run
/// use zonebot_core::state::FileCredentialStore;
/// use zonebot_core::traits::{ApiToken, CredentialStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCredentialStore::open("/var/lib/zonebot/accounts.json").await?;
///     store.save("work", &ApiToken::new("cf-token")).await?;
///     assert_eq!(store.list().await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles inside this process
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Open the store, creating parent directories and an empty file if needed
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create accounts directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };

        if !store.path.exists() {
            tracing::info!("Creating empty accounts file: {}", store.path.display());
            store.write_accounts(&Accounts::new()).await?;
        }

        Ok(store)
    }

    /// Read and decode the file, upgrading the legacy form in place
    async fn read_accounts(&self) -> Result<Accounts, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Accounts file does not exist: {}", self.path.display());
                return Ok(Accounts::new());
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read accounts file {}: {}. Treating as empty.",
                    self.path.display(),
                    e
                );
                return Ok(Accounts::new());
            }
        };

        match serde_json::from_str::<StoredAccounts>(&content) {
            Ok(StoredAccounts::Mapping(accounts)) => Ok(accounts),
            Ok(StoredAccounts::Legacy(entries)) => {
                let accounts: Accounts = entries
                    .into_iter()
                    .map(|entry| (entry.name, entry.token))
                    .collect();
                tracing::info!(
                    "Upgrading legacy accounts file {} ({} accounts)",
                    self.path.display(),
                    accounts.len()
                );
                if let Err(e) = self.write_accounts(&accounts).await {
                    tracing::warn!("Failed to rewrite upgraded accounts file: {}", e);
                }
                Ok(accounts)
            }
            Err(e) => {
                tracing::warn!(
                    "Accounts file {} is corrupted: {}. Treating as empty.",
                    self.path.display(),
                    e
                );
                Ok(Accounts::new())
            }
        }
    }

    /// Write the mapping atomically
    async fn write_accounts(&self, accounts: &Accounts) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(accounts)
            .map_err(|e| Error::credential_store(format!("Failed to serialize accounts: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::credential_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::credential_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::credential_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::credential_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Accounts written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn list(&self) -> Result<Accounts, Error> {
        self.read_accounts().await
    }

    async fn save(&self, name: &str, token: &ApiToken) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.read_accounts().await?;
        accounts.insert(name.to_string(), token.clone());
        self.write_accounts(&accounts).await
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.read_accounts().await?;
        if accounts.shift_remove(name).is_none() {
            return Ok(());
        }
        self.write_accounts(&accounts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("accounts.json");

        let store = FileCredentialStore::open(&path).await.unwrap();
        assert!(path.exists());
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).await.unwrap().trim(), "{}");
    }

    #[tokio::test]
    async fn test_save_delete_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileCredentialStore::open(&path).await.unwrap();
        store.save("work", &ApiToken::new("tok1")).await.unwrap();
        store.save("home", &ApiToken::new("tok2")).await.unwrap();
        store.save("work", &ApiToken::new("tok3")).await.unwrap();

        let reopened = FileCredentialStore::open(&path).await.unwrap();
        let accounts = reopened.list().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts.get("work").map(ApiToken::expose), Some("tok3"));

        reopened.delete("work").await.unwrap();
        reopened.delete("missing").await.unwrap();
        let accounts = store.list().await.unwrap();
        assert_eq!(accounts.keys().collect::<Vec<_>>(), vec!["home"]);
    }

    #[tokio::test]
    async fn test_legacy_list_is_upgraded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(
            &path,
            br#"[{"name": "work", "token": "tok1"}, {"name": "home", "token": "tok2"}]"#,
        )
        .await
        .unwrap();

        let store = FileCredentialStore::open(&path).await.unwrap();
        let accounts = store.list().await.unwrap();
        assert_eq!(accounts.keys().collect::<Vec<_>>(), vec!["work", "home"]);

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!({"work": "tok1", "home": "tok2"}));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, b"corrupted json data").await.unwrap();

        let store = FileCredentialStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        // The next save replaces the corrupt content
        store.save("work", &ApiToken::new("tok1")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
