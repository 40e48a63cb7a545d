// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Keeps domain state for the lifetime of the process only. Useful for tests
// and for one-shot runs that import and print without persisting anything.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::resource::DomainState;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use improvmx_core::resource::DomainState;
/// use improvmx_core::state::MemoryStateStore;
/// use improvmx_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     let state = DomainState { domain: "example.com".into(), ..Default::default() };
///     store.put(&state).await?;
///
///     let record = store.get("example.com").await?;
///     assert_eq!(record.map(|r| r.state), Some(state));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<BTreeMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of domains in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, domain: &str) -> Result<Option<StateRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(domain).cloned())
    }

    async fn put(&self, state: &DomainState) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(state.domain.clone(), StateRecord::new(state.clone()));
        Ok(())
    }

    async fn remove(&self, domain: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(domain);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str) -> DomainState {
        DomainState {
            domain: name.to_string(),
            ..DomainState::default()
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().await);

        store.put(&state("example.com")).await.unwrap();
        assert_eq!(store.len().await, 1);

        let record = store.get("example.com").await.unwrap().unwrap();
        assert_eq!(record.state.domain, "example.com");
        assert!(store.get("missing.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_list_sorted_and_remove() {
        let store = MemoryStateStore::new();
        store.put(&state("b.com")).await.unwrap();
        store.put(&state("a.com")).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a.com", "b.com"]);

        store.remove("a.com").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["b.com"]);
    }

    #[tokio::test]
    async fn test_memory_store_clone_shares_state() {
        let store = MemoryStateStore::new();
        let clone = store.clone();

        store.put(&state("example.com")).await.unwrap();

        assert_eq!(clone.len().await, 1);
    }
}
