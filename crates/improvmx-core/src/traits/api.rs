// # ImprovMX API Trait
//
// Defines the typed remote operations the reconciliation core consumes.
//
// ## Implementations
//
// - HTTP: `improvmx-client` crate
// - In-memory fake: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use improvmx_core::{ImprovMxApi, model::Alias};
//
// #[tokio::main]
// async fn main() -> improvmx_core::Result<()> {
//     let api = /* ImprovMxApi implementation */;
//
//     let domain = api.get_domain("example.com").await?;
//     api.create_alias(&domain.domain, &Alias::new("hello", "me@example.org")).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Alias, Check, Domain, DomainQuery};

/// Trait for the remote ImprovMX API facade
///
/// One method per remote endpoint. Each call is a single request; failures
/// are returned as-is using the crate error taxonomy:
///
/// - [`Error::NotFound`](crate::Error::NotFound): the domain or alias is absent
/// - [`Error::ValidationFailed`](crate::Error::ValidationFailed): the payload was rejected
/// - [`Error::Duplicate`](crate::Error::Duplicate): domain name or local-part collision
/// - [`Error::Transport`](crate::Error::Transport): network or decoding failure
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to the configured endpoint only
/// - ✅ Parse API responses into the shared model
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the remote is treated as strongly consistent)
/// - ❌ Cache responses between calls (every lifecycle call reads fresh state)
/// - ❌ Decide what to create, update or delete (owned by the resource lifecycle)
#[async_trait]
pub trait ImprovMxApi: Send + Sync {
    /// List domains matching the query
    async fn list_domains(&self, query: &DomainQuery) -> Result<Vec<Domain>>;

    /// Add a domain; fails with `Duplicate` if it already exists
    async fn add_domain(&self, domain: &Domain) -> Result<Domain>;

    /// Fetch a domain, including its aliases
    async fn get_domain(&self, name: &str) -> Result<Domain>;

    /// Replace the writable attributes of a domain
    async fn update_domain(&self, domain: &Domain) -> Result<Domain>;

    /// Remove a domain and everything it owns
    async fn delete_domain(&self, name: &str) -> Result<()>;

    /// Validate the DNS configuration of a domain
    async fn check_domain(&self, name: &str) -> Result<Check>;

    /// List the aliases of a domain
    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>>;

    /// Create an alias; fails with `Duplicate` if the local-part is taken
    async fn create_alias(&self, domain: &str, alias: &Alias) -> Result<Alias>;

    /// Change the forward target of an existing alias
    async fn update_alias(&self, domain: &str, alias: &Alias) -> Result<Alias>;

    /// Remove an alias, addressed by its local-part
    async fn delete_alias(&self, domain: &str, alias: &Alias) -> Result<()>;

    /// Name of the API implementation (for logging)
    fn api_name(&self) -> &'static str;
}
