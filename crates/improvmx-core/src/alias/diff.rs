//! Alias set differ
//!
//! Computes the create/delete/update partitions between two alias sets and
//! applies them against the remote API.
//!
//! ## Partitions
//!
//! Aliases are matched on local-part only:
//!
//! - `to_create = new − old`
//! - `to_delete = old − new`
//! - `to_update = new ∩ old`, carrying the new forward target
//!
//! ## Apply Order
//!
//! 1. All creates
//! 2. All deletes
//! 3. All updates
//!
//! Each call is attempted independently. Failures are collected into
//! [`Diagnostics`] and reported together once the whole batch has been
//! attempted. Cancellation stops the batch immediately.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::guarded;
use crate::error::{Diagnostic, Diagnostics, Error, Result};
use crate::model::{Alias, AliasSet};
use crate::traits::ImprovMxApi;

/// Remote calls needed to move a domain from one alias set to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasDiff {
    pub to_create: Vec<Alias>,
    pub to_delete: Vec<Alias>,
    pub to_update: Vec<Alias>,
}

impl AliasDiff {
    /// Partition `old` and `new` by local-part
    pub fn compute(old: &AliasSet, new: &AliasSet) -> Self {
        let to_create = new
            .iter()
            .filter(|alias| !old.contains(&alias.alias))
            .cloned()
            .collect();

        let to_delete = old
            .iter()
            .filter(|alias| !new.contains(&alias.alias))
            .cloned()
            .collect();

        let to_update = new
            .iter()
            .filter_map(|alias| {
                old.get(&alias.alias).map(|existing| Alias {
                    alias: alias.alias.clone(),
                    forward: alias.forward.clone(),
                    id: if alias.id != 0 { alias.id } else { existing.id },
                })
            })
            .collect();

        Self {
            to_create,
            to_delete,
            to_update,
        }
    }

    /// Number of remote calls `apply` will issue
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_delete.len() + self.to_update.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issue the remote calls: creates, then deletes, then updates
    ///
    /// # Returns
    ///
    /// - `Ok(())`: every call succeeded
    /// - `Err(Error::Diagnostics)`: one diagnostic per failed call
    /// - `Err(Error::Cancelled)`: the token fired; earlier calls stay applied
    pub async fn apply(
        &self,
        api: &dyn ImprovMxApi,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!(
            "Applying alias changes to {}: {} create, {} delete, {} update",
            domain,
            self.to_create.len(),
            self.to_delete.len(),
            self.to_update.len()
        );

        let mut diags = Diagnostics::new();

        for alias in &self.to_create {
            debug!("Creating alias {}@{}", alias.alias, domain);
            match guarded(cancel, api.create_alias(domain, alias)).await {
                Ok(created) => {
                    debug!("Created alias {}@{} (id {})", created.alias, domain, created.id)
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("Failed to create alias {}@{}: {}", alias.alias, domain, e);
                    diags.push(Diagnostic::error(
                        format!("error adding alias '{}' to domain '{}'", alias.alias, domain),
                        e.to_string(),
                    ));
                }
            }
        }

        for alias in &self.to_delete {
            debug!("Deleting alias {}@{}", alias.alias, domain);
            match guarded(cancel, api.delete_alias(domain, alias)).await {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("Failed to delete alias {}@{}: {}", alias.alias, domain, e);
                    diags.push(Diagnostic::error(
                        format!(
                            "error deleting alias '{}' from domain '{}'",
                            alias.alias, domain
                        ),
                        e.to_string(),
                    ));
                }
            }
        }

        for alias in &self.to_update {
            debug!("Updating alias {}@{} -> {}", alias.alias, domain, alias.forward);
            match guarded(cancel, api.update_alias(domain, alias)).await {
                Ok(_) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("Failed to update alias {}@{}: {}", alias.alias, domain, e);
                    diags.push(Diagnostic::error(
                        format!(
                            "error updating alias '{}' of domain '{}'",
                            alias.alias, domain
                        ),
                        e.to_string(),
                    ));
                }
            }
        }

        diags.into_result()
    }
}

/// Delete every alias currently on `domain`
///
/// The remote seeds a catch-all alias on every new domain. When the caller
/// declares an explicit alias set, those defaults are removed before the
/// declared aliases are created. Unlike [`AliasDiff::apply`], the first
/// failure aborts.
///
/// Returns the number of aliases deleted.
pub async fn clear_default_aliases(
    api: &dyn ImprovMxApi,
    domain: &str,
    cancel: &CancellationToken,
) -> Result<usize> {
    let defaults = guarded(cancel, api.list_aliases(domain)).await?;
    debug!("Removing {} default alias(es) from {}", defaults.len(), domain);

    for alias in &defaults {
        if let Err(e) = guarded(cancel, api.delete_alias(domain, alias)).await {
            if matches!(e, Error::Cancelled) {
                return Err(e);
            }
            let mut diags = Diagnostics::new();
            diags.push(Diagnostic::error(
                format!(
                    "error deleting default alias '{}' for domain '{}'",
                    alias.alias, domain
                ),
                e.to_string(),
            ));
            return Err(Error::Diagnostics(diags));
        }
    }

    Ok(defaults.len())
}
