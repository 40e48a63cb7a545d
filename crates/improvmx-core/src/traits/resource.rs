// # Resource and Data Source Traits
//
// The host runtime drives managed objects through these two interfaces.
//
// - [`Resource`]: create / read / update / delete / import of one managed object
// - [`DataSource`]: read-only lookup
//
// Both take typed configuration rather than untyped attribute maps, so the
// reconciliation logic can be exercised without any particular host.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Lifecycle of a managed resource
///
/// States are `absent` and `present`. `create` moves absent → present,
/// `update` and `read` keep it present, `delete` moves present → absent.
/// `id` is the stable identifier returned by `create` or passed to `import`.
///
/// Every operation accepts a cancellation token; when it fires, the
/// remaining remote calls are skipped and [`Error::Cancelled`](crate::Error::Cancelled)
/// is returned.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Declared configuration (input)
    type Config: Send + Sync;

    /// Observed state (output, persisted by the host)
    type State: Send + Sync;

    /// Type name used by the host (e.g. "improvmx_domain")
    fn type_name(&self) -> &'static str;

    /// Create the resource from its declared configuration
    async fn create(&self, config: &Self::Config, cancel: &CancellationToken)
    -> Result<Self::State>;

    /// Read the current state
    ///
    /// `config` is the declared configuration when the resource is managed,
    /// `None` when it is being imported or looked up.
    async fn read(
        &self,
        id: &str,
        config: Option<&Self::Config>,
        cancel: &CancellationToken,
    ) -> Result<Self::State>;

    /// Move the resource from `prior` state to the declared configuration
    async fn update(
        &self,
        id: &str,
        prior: &Self::State,
        config: &Self::Config,
        cancel: &CancellationToken,
    ) -> Result<Self::State>;

    /// Delete the resource
    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()>;

    /// Adopt an existing remote object by identifier alone
    async fn import(&self, id: &str, cancel: &CancellationToken) -> Result<Self::State> {
        self.read(id, None, cancel).await
    }
}

/// Read-only lookup exposed beside the resources
#[async_trait]
pub trait DataSource: Send + Sync {
    type Query: Send + Sync;
    type Output: Send;

    /// Type name used by the host (e.g. "improvmx_dns")
    fn type_name(&self) -> &'static str;

    async fn read(&self, query: &Self::Query, cancel: &CancellationToken) -> Result<Self::Output>;
}
