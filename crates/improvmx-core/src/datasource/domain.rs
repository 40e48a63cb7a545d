//! `improvmx_domain` data source

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::resource::{DomainResource, DomainState};
use crate::traits::{DataSource, ImprovMxApi};

pub const DOMAIN_DATA_SOURCE: &str = "improvmx_domain";

/// Looks up a single domain by name
///
/// Produces the same state as importing the domain resource.
#[derive(Debug, Clone)]
pub struct DomainDataSource {
    resource: DomainResource,
}

impl DomainDataSource {
    pub fn new(api: Arc<dyn ImprovMxApi>) -> Self {
        Self {
            resource: DomainResource::new(api),
        }
    }
}

#[async_trait]
impl DataSource for DomainDataSource {
    type Query = String;
    type Output = DomainState;

    fn type_name(&self) -> &'static str {
        DOMAIN_DATA_SOURCE
    }

    async fn read(&self, name: &String, cancel: &CancellationToken) -> Result<DomainState> {
        self.resource.fetch(name, None, cancel).await
    }
}
