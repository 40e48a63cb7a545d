//! Test doubles and common utilities for lifecycle contract tests
//!
//! [`FakeImprovMx`] is an in-memory stand-in for the remote API. It behaves
//! like the real service where the lifecycle depends on it: a catch-all alias
//! is seeded on every new domain, alias IDs are assigned on creation, and
//! local-part collisions are rejected. Every call is recorded in order and
//! individual calls can be made to fail.

#![allow(dead_code)]

use improvmx_core::Error;
use improvmx_core::error::Result;
use improvmx_core::model::{Alias, AliasSet, Check, Domain, DomainQuery, Record};
use improvmx_core::traits::ImprovMxApi;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One remote call, as observed by the fake
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    ListDomains,
    AddDomain(String),
    GetDomain(String),
    UpdateDomain(String),
    DeleteDomain(String),
    CheckDomain(String),
    ListAliases(String),
    CreateAlias(String),
    UpdateAlias(String),
    DeleteAlias(String),
}

impl Call {
    /// True for calls that touch a single alias
    pub fn is_alias_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateAlias(_) | Call::UpdateAlias(_) | Call::DeleteAlias(_)
        )
    }
}

#[derive(Debug, Default)]
struct FakeState {
    domains: BTreeMap<String, Domain>,
    next_alias_id: u64,
    calls: Vec<Call>,
    failures: HashMap<Call, String>,
}

/// In-memory remote API
#[derive(Debug, Clone, Default)]
pub struct FakeImprovMx {
    state: Arc<Mutex<FakeState>>,
}

impl FakeImprovMx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Only the calls that create, update or delete an alias
    pub fn alias_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(Call::is_alias_mutation)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make the given call fail with a transport error
    pub fn fail_on(&self, call: Call) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(call, "injected failure".to_string());
    }

    /// Insert a domain directly, bypassing the call log
    pub fn seed_domain(&self, name: &str, aliases: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        let mut domain = new_domain(name);
        for (alias, forward) in aliases {
            state.next_alias_id += 1;
            domain.aliases.push(Alias {
                alias: alias.to_string(),
                forward: forward.to_string(),
                id: state.next_alias_id,
            });
        }
        state.domains.insert(name.to_string(), domain);
    }

    /// Remote aliases of a domain, keyed by local-part
    pub fn aliases_of(&self, name: &str) -> AliasSet {
        self.state
            .lock()
            .unwrap()
            .domains
            .get(name)
            .map(|d| d.aliases.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_domain(&self, name: &str) -> bool {
        self.state.lock().unwrap().domains.contains_key(name)
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        match state.failures.get(&call) {
            Some(msg) => Err(Error::transport(msg.clone())),
            None => Ok(()),
        }
    }
}

fn new_domain(name: &str) -> Domain {
    Domain {
        domain: name.to_string(),
        active: true,
        display: name.to_string(),
        dkim_selector: "dkimprovmx".to_string(),
        added: 1_700_000_000_000,
        ..Domain::default()
    }
}

/// Check result the fake returns for every domain
pub fn default_check() -> Check {
    Check {
        provider: "improvmx".to_string(),
        mx: Record::expected(&["mx1.improvmx.com", "mx2.improvmx.com"]),
        spf: Record::expected(&["v=spf1 include:spf.improvmx.com -all"]),
        dkim1: Record::expected(&["dkimprovmx1.improvmx.com."]),
        dkim2: Record::expected(&["dkimprovmx2.improvmx.com."]),
        ..Check::default()
    }
}

/// Build an alias set from (local-part, forward) pairs
pub fn aliases(pairs: &[(&str, &str)]) -> AliasSet {
    pairs
        .iter()
        .map(|(alias, forward)| Alias::new(*alias, *forward))
        .collect()
}

pub fn token() -> CancellationToken {
    CancellationToken::new()
}

#[async_trait::async_trait]
impl ImprovMxApi for FakeImprovMx {
    async fn list_domains(&self, query: &DomainQuery) -> Result<Vec<Domain>> {
        self.record(Call::ListDomains)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .domains
            .values()
            .filter(|d| query.q.as_deref().is_none_or(|q| d.domain.contains(q)))
            .filter(|d| query.is_active.is_none_or(|active| d.active == active))
            .cloned()
            .collect())
    }

    async fn add_domain(&self, domain: &Domain) -> Result<Domain> {
        self.record(Call::AddDomain(domain.domain.clone()))?;
        let mut state = self.state.lock().unwrap();
        if state.domains.contains_key(&domain.domain) {
            return Err(Error::duplicate(format!(
                "domain {} already exists",
                domain.domain
            )));
        }

        state.next_alias_id += 1;
        let mut created = new_domain(&domain.domain);
        created.notification_email = domain.notification_email.clone();
        created.whitelabel = domain.whitelabel.clone();
        created.webhook = domain.webhook.clone();
        created.aliases.push(Alias {
            alias: "*".to_string(),
            forward: "owner@example.net".to_string(),
            id: state.next_alias_id,
        });

        state.domains.insert(domain.domain.clone(), created.clone());
        Ok(created)
    }

    async fn get_domain(&self, name: &str) -> Result<Domain> {
        self.record(Call::GetDomain(name.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .domains
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("domain {}", name)))
    }

    async fn update_domain(&self, domain: &Domain) -> Result<Domain> {
        self.record(Call::UpdateDomain(domain.domain.clone()))?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .domains
            .get_mut(&domain.domain)
            .ok_or_else(|| Error::not_found(format!("domain {}", domain.domain)))?;
        // A PUT carries every writable attribute; an unset one clears the remote value
        existing.notification_email = domain.notification_email.clone();
        existing.whitelabel = domain.whitelabel.clone();
        existing.webhook = domain.webhook.clone();
        Ok(existing.clone())
    }

    async fn delete_domain(&self, name: &str) -> Result<()> {
        self.record(Call::DeleteDomain(name.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state
            .domains
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("domain {}", name)))
    }

    async fn check_domain(&self, name: &str) -> Result<Check> {
        self.record(Call::CheckDomain(name.to_string()))?;
        let state = self.state.lock().unwrap();
        if !state.domains.contains_key(name) {
            return Err(Error::not_found(format!("domain {}", name)));
        }
        Ok(default_check())
    }

    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>> {
        self.record(Call::ListAliases(domain.to_string()))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .domains
            .get(domain)
            .map(|d| d.aliases.clone())
            .unwrap_or_default())
    }

    async fn create_alias(&self, domain: &str, alias: &Alias) -> Result<Alias> {
        self.record(Call::CreateAlias(alias.alias.clone()))?;
        let mut state = self.state.lock().unwrap();
        state.next_alias_id += 1;
        let id = state.next_alias_id;
        let existing = state
            .domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("domain {}", domain)))?;
        if existing.aliases.iter().any(|a| a.alias == alias.alias) {
            return Err(Error::duplicate(format!(
                "alias {} already exists",
                alias.alias
            )));
        }
        let created = Alias {
            alias: alias.alias.clone(),
            forward: alias.forward.clone(),
            id,
        };
        existing.aliases.push(created.clone());
        Ok(created)
    }

    async fn update_alias(&self, domain: &str, alias: &Alias) -> Result<Alias> {
        self.record(Call::UpdateAlias(alias.alias.clone()))?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .domains
            .get_mut(domain)
            .and_then(|d| d.aliases.iter_mut().find(|a| a.alias == alias.alias))
            .ok_or_else(|| Error::not_found(format!("alias {}@{}", alias.alias, domain)))?;
        existing.forward = alias.forward.clone();
        Ok(existing.clone())
    }

    async fn delete_alias(&self, domain: &str, alias: &Alias) -> Result<()> {
        self.record(Call::DeleteAlias(alias.alias.clone()))?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("domain {}", domain)))?;
        let before = existing.aliases.len();
        existing.aliases.retain(|a| a.alias != alias.alias);
        if existing.aliases.len() == before {
            return Err(Error::not_found(format!("alias {}@{}", alias.alias, domain)));
        }
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "fake"
    }
}
