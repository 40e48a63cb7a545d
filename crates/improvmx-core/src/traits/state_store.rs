// # State Store Trait
//
// Defines the interface the host uses to persist resource state between runs.
//
// ## Purpose
//
// The state store keeps the last observed [`DomainState`] of every managed
// domain. It supplies the prior state an update is diffed against, and the
// set of domains that should be deleted once they are no longer declared.
//
// ## Implementations
//
// - In-memory: [`MemoryStateStore`](crate::state::MemoryStateStore)
// - JSON file: [`FileStateStore`](crate::state::FileStateStore)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resource::DomainState;

/// Stored state of one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// The last observed state
    pub state: DomainState,
    /// Timestamp of the last write
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Wrap a state with the current time
    pub fn new(state: DomainState) -> Self {
        Self {
            state,
            last_updated: chrono::Utc::now(),
        }
    }

    /// Check if the record is stale (older than given duration)
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        let now = chrono::Utc::now();
        now.signed_duration_since(self.last_updated) > max_age
    }
}

/// Trait for state store implementations
///
/// Keyed by domain name. Implementations must be safe to call concurrently;
/// different domains are independent keys.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Cache state in memory (with explicit flush)
///
/// ## Forbidden Capabilities
/// - ❌ Call the remote API
/// - ❌ Decide whether a domain needs changes (owned by the host and resources)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the stored state of a domain
    async fn get(&self, domain: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Store the state of a domain, replacing any previous state
    async fn put(&self, state: &DomainState) -> Result<(), crate::Error>;

    /// Forget a domain
    async fn remove(&self, domain: &str) -> Result<(), crate::Error>;

    /// Names of all stored domains, sorted
    async fn list(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
