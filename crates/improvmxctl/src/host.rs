//! Drives resource lifecycles against the state store
//!
//! The host decides which lifecycle operation each domain needs; the
//! operations themselves live in `improvmx-core`.
//!
//! ```text
//! apply:   declared ∖ stored ─ create ─┐
//!          declared ∩ stored ─ read ─ (drift) ─ update ─┼─ put
//!          stored ∖ declared ─ delete ─ remove
//! refresh: stored ─ read ─ put
//! import:  read ─ put
//! destroy: stored ─ delete ─ remove
//! ```
//!
//! A failed domain does not stop the others; every failure is reported at
//! the end. Cancellation stops the run at once.

use improvmx_core::config::{DeclaredConfig, DomainConfig};
use improvmx_core::traits::{Resource, StateStore};
use improvmx_core::{Diagnostic, Diagnostics, DomainResource, Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What `apply` will do, domain by domain
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Plan<'a> {
    /// Declared but not in the state store
    pub create: Vec<&'a DomainConfig>,
    /// Declared and in the state store
    pub reconcile: Vec<&'a DomainConfig>,
    /// In the state store but no longer declared
    pub delete: Vec<String>,
}

impl<'a> Plan<'a> {
    pub fn new(declared: &'a DeclaredConfig, stored: &[String]) -> Self {
        let stored_set: BTreeSet<&str> = stored.iter().map(String::as_str).collect();
        let declared_set: BTreeSet<&str> =
            declared.domains.iter().map(|d| d.domain.as_str()).collect();

        let (reconcile, create): (Vec<_>, Vec<_>) = declared
            .domains
            .iter()
            .partition(|d| stored_set.contains(d.domain.as_str()));

        let delete = stored
            .iter()
            .filter(|name| !declared_set.contains(name.as_str()))
            .cloned()
            .collect();

        Self {
            create,
            reconcile,
            delete,
        }
    }
}

/// Counts of what a run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} deleted, {} failed",
            self.created, self.updated, self.unchanged, self.deleted, self.failed
        )
    }
}

pub struct Host {
    resource: DomainResource,
    store: Arc<dyn StateStore>,
}

impl Host {
    pub fn new(resource: DomainResource, store: Arc<dyn StateStore>) -> Self {
        Self { resource, store }
    }

    /// Make the remote match `declared`
    pub async fn apply(
        &self,
        declared: &DeclaredConfig,
        cancel: &CancellationToken,
    ) -> Result<Summary> {
        declared.validate()?;

        let stored = self.store.list().await?;
        let plan = Plan::new(declared, &stored);
        info!(
            "Plan: {} to create, {} to reconcile, {} to delete",
            plan.create.len(),
            plan.reconcile.len(),
            plan.delete.len()
        );

        let mut summary = Summary::default();
        let mut diags = Diagnostics::new();

        for config in plan.create {
            match self.create(config, cancel).await {
                Ok(()) => summary.created += 1,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    diags.extend(failure("create", &config.domain, e));
                }
            }
        }

        for config in plan.reconcile {
            match self.reconcile(config, cancel).await {
                Ok(Outcome::Updated) => summary.updated += 1,
                Ok(Outcome::Unchanged) => summary.unchanged += 1,
                Ok(Outcome::Created) => summary.created += 1,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    diags.extend(failure("update", &config.domain, e));
                }
            }
        }

        for name in plan.delete {
            match self.destroy_one(&name, cancel).await {
                Ok(()) => summary.deleted += 1,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    diags.extend(failure("delete", &name, e));
                }
            }
        }

        self.store.flush().await?;
        info!("Apply finished: {}", summary);
        diags.into_result().map(|()| summary)
    }

    async fn create(&self, config: &DomainConfig, cancel: &CancellationToken) -> Result<()> {
        match self.resource.create(config, cancel).await {
            Ok(state) => self.store.put(&state).await,
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                let adoptable = !matches!(e, Error::Duplicate(_) | Error::Config(_));
                let mut diags = failure("create", &config.domain, e);

                // The domain may exist even though a later step failed; keep tracking it
                if adoptable
                    && let Ok(state) = self
                        .resource
                        .read(&config.domain, Some(config), cancel)
                        .await
                {
                    warn!("Domain {} was created partially; tracking it", config.domain);
                    self.store.put(&state).await?;
                    diags.push(Diagnostic::warning(
                        format!("domain '{}' was created partially", config.domain),
                        "it is tracked in the state file; fix the error and apply again",
                    ));
                }
                Err(Error::Diagnostics(diags))
            }
        }
    }

    async fn reconcile(
        &self,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let current = match self.resource.read(&config.domain, Some(config), cancel).await {
            Ok(state) => state,
            Err(e) if e.is_not_found() => {
                warn!(
                    "Domain {} disappeared from the remote; creating it again",
                    config.domain
                );
                self.store.remove(&config.domain).await?;
                self.create(config, cancel).await?;
                return Ok(Outcome::Created);
            }
            Err(e) => return Err(e),
        };

        if !current.drifts_from(config) {
            debug!("Domain {} is up to date", config.domain);
            self.store.put(&current).await?;
            return Ok(Outcome::Unchanged);
        }

        let state = self
            .resource
            .update(&config.domain, &current, config, cancel)
            .await?;
        self.store.put(&state).await?;
        Ok(Outcome::Updated)
    }

    /// Re-read every stored domain
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Summary> {
        let mut summary = Summary::default();
        let mut diags = Diagnostics::new();

        for name in self.store.list().await? {
            match self.resource.read(&name, None, cancel).await {
                Ok(state) => {
                    self.store.put(&state).await?;
                    summary.unchanged += 1;
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    diags.extend(failure("read", &name, e));
                }
            }
        }

        self.store.flush().await?;
        diags.into_result().map(|()| summary)
    }

    /// Adopt a domain that already exists remotely
    pub async fn import(&self, domain: &str, cancel: &CancellationToken) -> Result<()> {
        let state = self.resource.import(domain, cancel).await?;
        self.store.put(&state).await?;
        info!(
            "Imported {} with {} alias(es)",
            domain,
            state.aliases().len()
        );
        Ok(())
    }

    /// Delete one stored domain, or all of them
    pub async fn destroy(
        &self,
        domain: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Summary> {
        let targets = match domain {
            Some(name) => {
                if self.store.get(name).await?.is_none() {
                    return Err(Error::config(format!(
                        "Domain {} is not in the state file",
                        name
                    )));
                }
                vec![name.to_string()]
            }
            None => self.store.list().await?,
        };

        let mut summary = Summary::default();
        let mut diags = Diagnostics::new();
        for name in targets {
            match self.destroy_one(&name, cancel).await {
                Ok(()) => summary.deleted += 1,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    diags.extend(failure("delete", &name, e));
                }
            }
        }

        self.store.flush().await?;
        diags.into_result().map(|()| summary)
    }

    async fn destroy_one(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.resource.delete(name, cancel).await?;
        self.store.remove(name).await
    }
}

enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Diagnostics for one failed domain
fn failure(action: &str, domain: &str, err: Error) -> Diagnostics {
    let mut diags = Diagnostics::new();
    match err {
        Error::Diagnostics(inner) => diags.extend(inner),
        other => diags.push(Diagnostic::error(
            format!("failed to {} domain '{}'", action, domain),
            other.to_string(),
        )),
    }
    diags
}
