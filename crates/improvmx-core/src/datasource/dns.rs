//! `improvmx_dns` data source

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cancel::guarded;
use crate::dns::project;
use crate::error::Result;
use crate::model::DnsRecord;
use crate::traits::{DataSource, ImprovMxApi};

pub const DNS_DATA_SOURCE: &str = "improvmx_dns";

/// DNS records a domain needs to work with ImprovMX
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsState {
    pub domain: String,
    pub records: Vec<DnsRecord>,
}

/// Projects a fresh check of a domain into DNS records
#[derive(Clone)]
pub struct DnsDataSource {
    api: Arc<dyn ImprovMxApi>,
}

impl DnsDataSource {
    pub fn new(api: Arc<dyn ImprovMxApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for DnsDataSource {
    type Query = String;
    type Output = DnsState;

    fn type_name(&self) -> &'static str {
        DNS_DATA_SOURCE
    }

    async fn read(&self, name: &String, cancel: &CancellationToken) -> Result<DnsState> {
        let check = guarded(cancel, self.api.check_domain(name)).await?;
        Ok(DnsState {
            domain: name.clone(),
            records: project(&check),
        })
    }
}
