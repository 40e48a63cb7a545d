// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Persists the last observed state of every managed domain between runs of
// the host. The next `apply` diffs declared aliases against this state, and
// domains present here but no longer declared are destroyed.
//
// ## Crash Recovery
//
// - Atomic writes: write to `<name>.tmp`, then rename over the state file
// - Backup: the previous state file is copied to `<name>.backup` before each write
// - Recovery: a state file that fails to parse is replaced by its backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "domains": {
//     "example.com": {
//       "state": { "domain": "example.com", "alias": [ ... ], "dns": [ ... ] },
//       "last_updated": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::resource::DomainState;
use crate::traits::state_store::{StateRecord, StateStore};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store with crash recovery
///
/// Every mutation is written through to disk before it returns.
///
/// # Example
///
/// ```rust,no_run
/// use improvmx_core::resource::DomainState;
/// use improvmx_core::state::FileStateStore;
/// use improvmx_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("improvmx-state.json").await?;
///
///     let state = DomainState { domain: "example.com".into(), ..Default::default() };
///     store.put(&state).await?;
///
///     assert_eq!(store.list().await?, vec!["example.com"]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    domains: BTreeMap<String, StateRecord>,
    dirty: bool,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    #[serde(default)]
    domains: BTreeMap<String, StateRecord>,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// 1. Create parent directories if needed
    /// 2. Load the state file, or start empty if there is none
    /// 3. If the state file is corrupted, load the backup instead
    /// 4. If the backup is missing or corrupted too, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let domains = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                domains,
                dirty: false,
            })),
        })
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_state_with_recovery(
        path: &Path,
    ) -> Result<BTreeMap<String, StateRecord>, Error> {
        let parse_error = match Self::load_state(path).await {
            Ok(domains) => {
                tracing::debug!("Loaded state from file: {} domain(s)", domains.len());
                return Ok(domains);
            }
            Err(Error::Json(e)) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "State file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            parse_error
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty state.");
            return Ok(BTreeMap::new());
        }

        match Self::load_state(&backup_path).await {
            Ok(domains) => {
                tracing::info!("Recovered state from backup: {} domain(s)", domains.len());
                if let Err(e) = Self::restore_from_backup(path, &backup_path).await {
                    tracing::error!("Failed to restore state file from backup: {}", e);
                }
                Ok(domains)
            }
            Err(e) => {
                tracing::error!("Backup also unreadable: {}. Starting with empty state.", e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Load state from file; parse failures surface as `Error::Json`
    async fn load_state(path: &Path) -> Result<BTreeMap<String, StateRecord>, Error> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content)?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.domains)
    }

    /// Write state to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        let mut state_guard = self.state.write().await;

        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            domains: state_guard.domains.clone(),
        };

        let json = serde_json::to_string_pretty(&state_file)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        let temp_path = Self::temp_path(&self.path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state_guard.dirty = false;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, domain: &str) -> Result<Option<StateRecord>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.domains.get(domain).cloned())
    }

    async fn put(&self, state: &DomainState) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard
                .domains
                .insert(state.domain.clone(), StateRecord::new(state.clone()));
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn remove(&self, domain: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            if state_guard.domains.remove(domain).is_none() {
                return Ok(());
            }
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.domains.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_state().await
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alias, AliasSet};
    use tempfile::tempdir;

    fn state(name: &str, forward: &str) -> DomainState {
        let aliases: AliasSet = [Alias {
            alias: "hello".into(),
            forward: forward.into(),
            id: 1,
        }]
        .into_iter()
        .collect();

        DomainState {
            domain: name.to_string(),
            active: true,
            alias: Some(aliases),
            ..DomainState::default()
        }
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let saved = state("example.com", "a@x.com");
        store.put(&saved).await.unwrap();
        assert!(path.exists());

        // Reload and verify persistence
        let store2 = FileStateStore::new(&path).await.unwrap();
        let record = store2.get("example.com").await.unwrap().unwrap();
        assert_eq!(record.state, saved);
    }

    #[tokio::test]
    async fn test_file_store_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&state("a.com", "a@x.com")).await.unwrap();
        store.put(&state("b.com", "b@x.com")).await.unwrap();
        store.remove("a.com").await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.list().await.unwrap(), vec!["b.com"]);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&state("example.com", "a@x.com")).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&state("example.com", "first@x.com")).await.unwrap();
        // Second write leaves the first in the backup
        store.put(&state("example.com", "second@x.com")).await.unwrap();

        let backup_path = FileStateStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        let recovered = store2.get("example.com").await.unwrap().unwrap();
        assert_eq!(
            recovered.state.aliases().get("hello").unwrap().forward,
            "first@x.com",
            "Backup should contain previous state, not latest"
        );
    }

    #[tokio::test]
    async fn test_file_store_corrupted_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_flush_is_noop_when_clean() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.flush().await.unwrap();

        assert!(!path.exists());
    }
}
