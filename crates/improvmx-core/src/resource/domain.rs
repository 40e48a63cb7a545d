//! Domain resource lifecycle
//!
//! Orchestrates the remote calls behind one `improvmx_domain` resource.
//!
//! ## Flow
//!
//! ```text
//! create:  AddDomain ─┬─ (aliases declared) ─ clear defaults ─ apply diff(∅, declared) ─┐
//!                     └───────────────────────────────────────────────────────────────┴─ read
//! read:    GetDomain ─ CheckDomain ─ project DNS ─ normalize aliases
//! update:  UpdateDomain ─ (aliases changed) ─ apply diff(prior, declared) ─ read
//! delete:  DeleteDomain
//! import:  read (aliases as observed remotely)
//! ```
//!
//! Single-call steps abort on the first error. Alias batches collect every
//! failure (see [`AliasDiff::apply`]). Nothing is rolled back: a create whose
//! aliases fail leaves the domain in place.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::alias::{AliasDiff, clear_default_aliases};
use crate::cancel::guarded;
use crate::config::DomainConfig;
use crate::dns::project;
use crate::error::{Error, Result};
use crate::model::{AliasSet, Check, DnsRecord, Domain};
use crate::traits::{ImprovMxApi, Resource};

/// Type name of the domain resource
pub const DOMAIN_RESOURCE: &str = "improvmx_domain";

/// Observed state of a domain resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainState {
    /// Domain name, also the stable identifier
    pub domain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notification_email: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub whitelabel: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub webhook: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub display: String,

    #[serde(default)]
    pub dkim_selector: String,

    /// Creation timestamp reported by the remote
    #[serde(default)]
    pub added: i64,

    /// DNS records the owner has to publish, from a fresh check
    #[serde(default)]
    pub dns: Vec<DnsRecord>,

    /// Aliases as observed remotely; `None` when there are none to report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<AliasSet>,
}

impl DomainState {
    /// Build the state from a fetched domain and its check
    ///
    /// A domain without remote aliases whose declared `alias` attribute is
    /// present but empty reports `None`, so an empty declared block does not
    /// show up as a change.
    pub fn from_remote(domain: Domain, check: &Check, config: Option<&DomainConfig>) -> Self {
        let declared_empty = config
            .and_then(|c| c.alias.as_ref())
            .is_some_and(AliasSet::is_empty);

        let alias = if domain.aliases.is_empty() && declared_empty {
            None
        } else {
            Some(domain.aliases.into_iter().collect())
        };

        Self {
            domain: domain.domain,
            notification_email: domain.notification_email,
            whitelabel: domain.whitelabel,
            webhook: domain.webhook,
            active: domain.active,
            display: domain.display,
            dkim_selector: domain.dkim_selector,
            added: domain.added,
            dns: project(check),
            alias,
        }
    }

    /// Aliases in this state, empty when none are reported
    pub fn aliases(&self) -> AliasSet {
        self.alias.clone().unwrap_or_default()
    }

    /// True if applying `config` on top of this state would change anything
    pub fn drifts_from(&self, config: &DomainConfig) -> bool {
        let attr = |declared: &Option<String>, observed: &str| {
            declared.as_deref().unwrap_or_default() != observed
        };

        attr(&config.notification_email, &self.notification_email)
            || attr(&config.whitelabel, &self.whitelabel)
            || attr(&config.webhook, &self.webhook)
            || config
                .alias
                .as_ref()
                .is_some_and(|declared| !declared.same_targets(&self.aliases()))
    }
}

/// The `improvmx_domain` resource
#[derive(Clone)]
pub struct DomainResource {
    api: Arc<dyn ImprovMxApi>,
}

impl std::fmt::Debug for DomainResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainResource")
            .field("api", &self.api.api_name())
            .finish()
    }
}

impl DomainResource {
    pub fn new(api: Arc<dyn ImprovMxApi>) -> Self {
        Self { api }
    }

    /// Fetch a domain and its check without reference to declared config
    pub(crate) async fn fetch(
        &self,
        name: &str,
        config: Option<&DomainConfig>,
        cancel: &CancellationToken,
    ) -> Result<DomainState> {
        let domain = guarded(cancel, self.api.get_domain(name)).await?;
        let check = guarded(cancel, self.api.check_domain(name)).await?;
        debug!(
            "Read domain {}: {} alias(es), DNS valid: {}",
            name,
            domain.aliases.len(),
            check.valid
        );
        Ok(DomainState::from_remote(domain, &check, config))
    }
}

#[async_trait]
impl Resource for DomainResource {
    type Config = DomainConfig;
    type State = DomainState;

    fn type_name(&self) -> &'static str {
        DOMAIN_RESOURCE
    }

    async fn create(
        &self,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<DomainState> {
        config.validate()?;
        info!("Creating domain {}", config.domain);

        let added = guarded(cancel, self.api.add_domain(&config.to_payload())).await?;
        let id = if added.domain.is_empty() {
            config.domain.clone()
        } else {
            added.domain
        };

        if let Some(aliases) = config.alias.as_ref().filter(|a| !a.is_empty()) {
            let removed = clear_default_aliases(self.api.as_ref(), &id, cancel).await?;
            debug!("Removed {} default alias(es) from {}", removed, id);

            AliasDiff::compute(&AliasSet::new(), aliases)
                .apply(self.api.as_ref(), &id, cancel)
                .await?;
        }

        info!("Domain {} created", id);
        self.read(&id, Some(config), cancel).await
    }

    async fn read(
        &self,
        id: &str,
        config: Option<&DomainConfig>,
        cancel: &CancellationToken,
    ) -> Result<DomainState> {
        self.fetch(id, config, cancel).await
    }

    async fn update(
        &self,
        id: &str,
        prior: &DomainState,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<DomainState> {
        config.validate()?;
        if config.domain != id {
            return Err(Error::config(format!(
                "Domain name is immutable: '{}' cannot become '{}'. Destroy and recreate instead.",
                id, config.domain
            )));
        }

        info!("Updating domain {}", id);
        guarded(cancel, self.api.update_domain(&config.to_payload())).await?;

        if let Some(declared) = &config.alias {
            let previous = prior.aliases();
            if !previous.same_targets(declared) {
                AliasDiff::compute(&previous, declared)
                    .apply(self.api.as_ref(), id, cancel)
                    .await?;
            } else {
                debug!("Aliases of {} unchanged", id);
            }
        }

        self.read(id, Some(config), cancel).await
    }

    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        info!("Deleting domain {}", id);
        guarded(cancel, self.api.delete_domain(id)).await?;
        info!("Domain {} deleted", id);
        Ok(())
    }
}
