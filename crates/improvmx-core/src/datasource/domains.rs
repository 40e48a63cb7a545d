//! `improvmx_domains` data source
//!
//! Lists the active domains of the account. Each entry carries a DNS
//! projection from its own fresh check; aliases are not included.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancel::guarded;
use crate::error::Result;
use crate::model::DomainQuery;
use crate::resource::DomainState;
use crate::traits::{DataSource, ImprovMxApi};

pub const DOMAINS_DATA_SOURCE: &str = "improvmx_domains";

/// Filter for the domains data source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainsQuery {
    /// Only domains starting with this value
    #[serde(default)]
    pub query: Option<String>,
}

/// Output of the domains data source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainsState {
    /// Checksum of the sorted domain names
    pub id: String,
    pub domains: Vec<DomainState>,
}

/// Stable identifier for a list of domains, independent of listing order
pub fn domains_checksum(names: &[&str]) -> String {
    let mut sorted = names.to_vec();
    sorted.sort_unstable();
    hex::encode(Sha256::digest(sorted.concat().as_bytes()))
}

/// Lists domains of the account
#[derive(Clone)]
pub struct DomainsDataSource {
    api: Arc<dyn ImprovMxApi>,
}

impl DomainsDataSource {
    pub fn new(api: Arc<dyn ImprovMxApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for DomainsDataSource {
    type Query = DomainsQuery;
    type Output = DomainsState;

    fn type_name(&self) -> &'static str {
        DOMAINS_DATA_SOURCE
    }

    async fn read(&self, query: &DomainsQuery, cancel: &CancellationToken) -> Result<DomainsState> {
        let filter = DomainQuery {
            q: query.query.clone().filter(|q| !q.is_empty()),
            is_active: Some(true),
        };
        let listed = guarded(cancel, self.api.list_domains(&filter)).await?;
        debug!("Listed {} domain(s)", listed.len());

        let names: Vec<String> = listed.iter().map(|d| d.domain.clone()).collect();
        let mut domains = Vec::with_capacity(listed.len());
        for mut domain in listed {
            let check = guarded(cancel, self.api.check_domain(&domain.domain)).await?;
            domain.aliases.clear();
            let mut state = DomainState::from_remote(domain, &check, None);
            state.alias = None;
            domains.push(state);
        }

        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        Ok(DomainsState {
            id: domains_checksum(&refs),
            domains,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_ignores_order() {
        assert_eq!(
            domains_checksum(&["b.com", "a.com"]),
            domains_checksum(&["a.com", "b.com"])
        );
        assert_ne!(domains_checksum(&["a.com"]), domains_checksum(&["b.com"]));
        assert_eq!(domains_checksum(&[]).len(), 64);
    }
}
